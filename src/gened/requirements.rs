/// Pathways and College Option requirements, in report order.
pub const PATHWAYS_REQUIREMENTS: &[&str] = &[
    "EC", "MQR", "LPS", "WCGI", "USED", "CE", "IS", "SW", "QNSLIT", "QNSLANG", "QNSSCI", "QNSSYN",
    "WRIC",
];

/// Perspectives (PLAS) requirements, in report order.
pub const PLAS_REQUIREMENTS: &[&str] = &[
    "AP", "CV", "NS", "NS+L", "RL", "SS", "US", "ET", "WC", "PI", "WRIC",
];

/// System designation code → Pathways abbreviation.
pub fn pathways_code(designation: &str) -> Option<&'static str> {
    Some(match designation {
        "RECR" => "EC",
        "RMQR" => "MQR",
        "RLPR" => "LPS",
        "FWGR" => "WCGI",
        "FUSR" => "USED",
        "FCER" => "CE",
        "FISR" => "IS",
        "FSWR" => "SW",
        _ => return None,
    })
}

pub fn requirement_name(code: &str) -> Option<&'static str> {
    Some(match code {
        "EC" => "English Composition",
        "MQR" => "Mathematics and Quantitative Reasoning",
        "LPS" => "Life and Physical Sciences",
        "WCGI" => "World Cultures and Global Issues",
        "USED" => "United States Experience in its Diversity",
        "CE" => "Creative Expression",
        "IS" => "Individual and Society",
        "SW" => "Scientific World",
        "QNSLIT" => "QC Literature",
        "QNSLANG" => "QC Language",
        "QNSSCI" => "QC Science",
        "QNSSYN" => "QC Synthesis",
        "WRIC" => "Writing Intensive",
        "AP" => "Appreciating and Participating in the Arts",
        "CV" => "Culture and Values",
        "NS" => "Natural Science",
        "NS+L" => "Natural Science with Laboratory",
        "RL" => "Reading Literature",
        "SS" => "Analyzing Social Structures",
        "US" => "United States",
        "ET" => "European Traditions",
        "WC" => "World Cultures",
        "PI" => "Pre-Industrial Society",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_requirement_has_a_name() {
        for code in PATHWAYS_REQUIREMENTS.iter().chain(PLAS_REQUIREMENTS) {
            assert!(requirement_name(code).is_some(), "{}", code);
        }
        assert_eq!(pathways_code("RLPR"), Some("LPS"));
        assert_eq!(pathways_code("QNSLIT"), None);
    }
}
