//! Context-menu entries for the templates available on the active tab

use crate::models::Template;
use serde::{Deserialize, Serialize};

pub const MENU_ITEM_PREFIX: &str = "template-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
}

pub fn build_menu(templates: &[Template]) -> Vec<MenuItem> {
    templates
        .iter()
        .map(|template| MenuItem {
            id: format!("{}{}", MENU_ITEM_PREFIX, template.id),
            title: template.name.clone(),
        })
        .collect()
}

pub fn template_id_from_menu_item(menu_item_id: &str) -> Option<&str> {
    menu_item_id
        .strip_prefix(MENU_ITEM_PREFIX)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_ids_round_trip() {
        let menu = build_menu(&[Template::default_template()]);
        assert_eq!(menu[0].id, "template-default");
        assert_eq!(menu[0].title, "Default Template");
        assert_eq!(template_id_from_menu_item(&menu[0].id), Some("default"));
    }

    #[test]
    fn test_foreign_menu_ids_are_ignored() {
        assert_eq!(template_id_from_menu_item("open-options"), None);
        assert_eq!(template_id_from_menu_item("template-"), None);
    }
}
