use serde::Serialize;

/// One data line of the enrollment query, renamed onto a fixed schema.
/// Values are the raw text of the extract; numeric fields may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RawEnrollmentRow {
    pub institution: String,
    pub term: String,
    pub session: String,
    pub subject: String,
    pub catalog_number: String,
    pub title: String,
    pub class_number: String,
    pub section: String,
    pub status: String,
    pub component: String,
    pub enrollment: String,
    pub limit: String,
    pub room: String,
    /// Monday first.
    pub meeting_days: [bool; 7],
    pub meeting_start: String,
    pub meeting_end: String,
    pub instruction_mode: String,
    pub instructor: String,
    pub role: String,
    pub attributes: String,
    pub fees: String,
    pub notes: String,
    pub career: String,
    pub primary_component: String,
    /// Query run date as `m/d/yy`.
    pub sysdate: String,
}

impl RawEnrollmentRow {
    /// Course string used for grouping and gen-ed lookup, e.g. `ENGL 110`.
    pub fn course(&self) -> String {
        format!("{} {}", self.subject.trim(), self.catalog_number.trim())
    }
}

/// Columns of the fixed schema. The header aliases are normalized names
/// (see [`normalize_header`](super::normalize_header)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Institution,
    Term,
    Session,
    Subject,
    CatalogNumber,
    Title,
    ClassNumber,
    Section,
    Status,
    Component,
    Enrollment,
    Limit,
    Room,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
    MeetingStart,
    MeetingEnd,
    InstructionMode,
    Instructor,
    Role,
    Attributes,
    Fees,
    Notes,
    Career,
    PrimaryComponent,
    Sysdate,
}

impl Column {
    pub const ALL: [Column; 31] = [
        Column::Institution,
        Column::Term,
        Column::Session,
        Column::Subject,
        Column::CatalogNumber,
        Column::Title,
        Column::ClassNumber,
        Column::Section,
        Column::Status,
        Column::Component,
        Column::Enrollment,
        Column::Limit,
        Column::Room,
        Column::Mon,
        Column::Tue,
        Column::Wed,
        Column::Thu,
        Column::Fri,
        Column::Sat,
        Column::Sun,
        Column::MeetingStart,
        Column::MeetingEnd,
        Column::InstructionMode,
        Column::Instructor,
        Column::Role,
        Column::Attributes,
        Column::Fees,
        Column::Notes,
        Column::Career,
        Column::PrimaryComponent,
        Column::Sysdate,
    ];

    pub const DAYS: [Column; 7] = [
        Column::Mon,
        Column::Tue,
        Column::Wed,
        Column::Thu,
        Column::Fri,
        Column::Sat,
        Column::Sun,
    ];

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Institution => &["institution"],
            Column::Term => &["term"],
            Column::Session => &["session"],
            Column::Subject => &["subject_area", "subject", "discipline"],
            Column::CatalogNumber => &["catalog_nbr", "catalog_number", "catalog_num"],
            Column::Title => &["class_title", "course_title", "title"],
            Column::ClassNumber => &["class_nbr", "class_number", "class_num"],
            Column::Section => &["class_section", "section"],
            Column::Status => &["class_status", "status"],
            Column::Component => &["course_component", "component"],
            Column::Enrollment => &["enrollment_total", "enrollment", "enrolled"],
            Column::Limit => &["enrollment_capacity", "enrollment_limit", "limit", "capacity"],
            Column::Room => &["room", "facility"],
            Column::Mon => &["mon", "monday"],
            Column::Tue => &["tues", "tue", "tuesday"],
            Column::Wed => &["wed", "wednesday"],
            Column::Thu => &["thurs", "thu", "thursday"],
            Column::Fri => &["fri", "friday"],
            Column::Sat => &["sat", "saturday"],
            Column::Sun => &["sun", "sunday"],
            Column::MeetingStart => &["mtg_start", "meeting_time_start", "start_time"],
            Column::MeetingEnd => &["mtg_end", "meeting_time_end", "end_time"],
            Column::InstructionMode => &["instruction_mode", "mode"],
            Column::Instructor => &["instructor", "instructor_name", "name"],
            Column::Role => &["role", "instructor_role"],
            Column::Attributes => &["attributes", "course_attributes", "crse_attr_value"],
            Column::Fees => &["fees_exist", "has_fees", "fees"],
            Column::Notes => &["notes", "class_notes"],
            Column::Career => &["career", "level"],
            Column::PrimaryComponent => &["primary_component"],
            Column::Sysdate => &["sysdate"],
        }
    }

    /// Columns without which a row cannot be keyed or counted.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            Column::Term
                | Column::Session
                | Column::Subject
                | Column::CatalogNumber
                | Column::ClassNumber
                | Column::Component
                | Column::Enrollment
                | Column::Limit
        )
    }

    /// Header label used in error messages.
    pub fn label(self) -> &'static str {
        self.aliases()[0]
    }
}
