//! Accessibility roles

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a node in the accessibility tree.
///
/// Roles the engine does not know deserialize to [`Role::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Alert,
    AlertDialog,
    Application,
    Button,
    CheckBox,
    ComboBoxSelect,
    Desktop,
    Dialog,
    GenericContainer,
    Group,
    Heading,
    Image,
    Link,
    List,
    ListBox,
    ListBoxOption,
    ListItem,
    Menu,
    MenuItem,
    MenuItemCheckBox,
    MenuListPopup,
    Pane,
    PopUpButton,
    RadioButton,
    RootWebArea,
    ScrollBar,
    SearchBox,
    Slider,
    StaticText,
    Switch,
    Tab,
    TabList,
    TabPanel,
    TextField,
    ToggleButton,
    Toolbar,
    Tree,
    TreeItem,
    Window,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Alert => "alert",
            Role::AlertDialog => "alertDialog",
            Role::Application => "application",
            Role::Button => "button",
            Role::CheckBox => "checkBox",
            Role::ComboBoxSelect => "comboBoxSelect",
            Role::Desktop => "desktop",
            Role::Dialog => "dialog",
            Role::GenericContainer => "genericContainer",
            Role::Group => "group",
            Role::Heading => "heading",
            Role::Image => "image",
            Role::Link => "link",
            Role::List => "list",
            Role::ListBox => "listBox",
            Role::ListBoxOption => "listBoxOption",
            Role::ListItem => "listItem",
            Role::Menu => "menu",
            Role::MenuItem => "menuItem",
            Role::MenuItemCheckBox => "menuItemCheckBox",
            Role::MenuListPopup => "menuListPopup",
            Role::Pane => "pane",
            Role::PopUpButton => "popUpButton",
            Role::RadioButton => "radioButton",
            Role::RootWebArea => "rootWebArea",
            Role::ScrollBar => "scrollBar",
            Role::SearchBox => "searchBox",
            Role::Slider => "slider",
            Role::StaticText => "staticText",
            Role::Switch => "switch",
            Role::Tab => "tab",
            Role::TabList => "tabList",
            Role::TabPanel => "tabPanel",
            Role::TextField => "textField",
            Role::ToggleButton => "toggleButton",
            Role::Toolbar => "toolbar",
            Role::Tree => "tree",
            Role::TreeItem => "treeItem",
            Role::Window => "window",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_roles_deserialize_to_unknown() {
        let role: Role = serde_yaml::from_str("button").unwrap();
        assert_eq!(role, Role::Button);

        let role: Role = serde_yaml::from_str("splitter").unwrap();
        assert_eq!(role, Role::Unknown);
    }

    #[test]
    fn test_display_matches_wire_name() {
        assert_eq!(Role::RootWebArea.to_string(), "rootWebArea");
        assert_eq!(serde_json::to_string(&Role::TabList).unwrap(), "\"tabList\"");
    }
}
