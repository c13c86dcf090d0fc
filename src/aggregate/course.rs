use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::record::{percent_filled, ClassRecord};
use crate::gened::GenEd;

/// Active sections of one course, summed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CourseAggregate {
    pub course: String,
    pub title: String,
    pub sections: BTreeSet<String>,
    pub enrollment: u64,
    pub limit: u64,
    pub gened: GenEd,
}

impl CourseAggregate {
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn percent_filled(&self) -> Option<u32> {
        percent_filled(self.enrollment, self.limit)
    }
}

/// Roll Active class records up by course string.
pub fn rollup<'a, I>(classes: I) -> BTreeMap<String, CourseAggregate>
where
    I: IntoIterator<Item = &'a ClassRecord>,
{
    let mut courses: BTreeMap<String, CourseAggregate> = BTreeMap::new();
    for class in classes.into_iter().filter(|c| c.is_active()) {
        let agg = courses
            .entry(class.course.clone())
            .or_insert_with(|| CourseAggregate {
                course: class.course.clone(),
                title: class.title.clone(),
                sections: BTreeSet::new(),
                enrollment: 0,
                limit: 0,
                gened: class.gened.clone(),
            });
        agg.sections.insert(class.section.clone());
        agg.enrollment += class.enrollment as u64;
        agg.limit += class.limit as u64;
    }
    courses
}

/// Requirement code → courses satisfying it (RD plus each attribute).
pub fn offered_by_requirement(
    courses: &BTreeMap<String, CourseAggregate>,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut offered: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (course, agg) in courses {
        for code in agg.gened.requirement_codes() {
            offered.entry(code).or_default().insert(course.clone());
        }
    }
    offered
}
