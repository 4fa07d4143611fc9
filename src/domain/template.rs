//! Default checklist template for new members

use super::checklist::{ChecklistOption, Section};

/// Label of the owner's own checklist
pub const DEFAULT_MEMBER_NAME: &str = "Me";

/// Sections every new checklist starts with
pub fn default_sections() -> Vec<Section> {
    let section = |title: &str, items: &[&str]| {
        Section::new(title, items.iter().map(|t| ChecklistOption::new(*t)).collect())
    };

    vec![
        section("Gear", &["Goggles", "Gloves", "Helmet/Beanie"]),
        section("Clothing", &["Jacket", "Pants"]),
        section("Other", &["Accommodation booked", "Lift pass"]),
    ]
}
