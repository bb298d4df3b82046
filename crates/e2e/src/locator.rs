//! Role-based element locators
//!
//! A [`Locator`] is plain data. It is serialized to the driver, which maps
//! it onto `getByRole`, `getByText`, `getByLabel`, and friends. Locators can
//! be scoped with [`Locator::within`], so "the 삭제 button in the row that
//! has text X" is expressible without CSS.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ARIA roles the console is driven through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    Button,
    Cell,
    Checkbox,
    Combobox,
    Dialog,
    Gridcell,
    Group,
    Heading,
    Link,
    Listbox,
    Menuitem,
    Option,
    Row,
    Spinbutton,
    Tab,
    Textbox,
    Tree,
    Treeitem,
}

impl AriaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AriaRole::Button => "button",
            AriaRole::Cell => "cell",
            AriaRole::Checkbox => "checkbox",
            AriaRole::Combobox => "combobox",
            AriaRole::Dialog => "dialog",
            AriaRole::Gridcell => "gridcell",
            AriaRole::Group => "group",
            AriaRole::Heading => "heading",
            AriaRole::Link => "link",
            AriaRole::Listbox => "listbox",
            AriaRole::Menuitem => "menuitem",
            AriaRole::Option => "option",
            AriaRole::Row => "row",
            AriaRole::Spinbutton => "spinbutton",
            AriaRole::Tab => "tab",
            AriaRole::Textbox => "textbox",
            AriaRole::Tree => "tree",
            AriaRole::Treeitem => "treeitem",
        }
    }
}

/// How the base element is found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum By {
    Role {
        role: AriaRole,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Text { text: String },
    Label { text: String },
    Placeholder { text: String },
    TestId { id: String },
    Css { selector: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locator {
    #[serde(flatten)]
    pub by: By,

    /// Match the accessible name / text exactly instead of by substring
    #[serde(default)]
    pub exact: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within: Option<Box<Locator>>,
}

impl Locator {
    fn from_by(by: By) -> Self {
        Self {
            by,
            exact: false,
            has_text: None,
            nth: None,
            within: None,
        }
    }

    /// Any element with the given role
    pub fn role(role: AriaRole) -> Self {
        Self::from_by(By::Role { role, name: None })
    }

    /// Element with the given role and accessible name (exact match)
    pub fn named(role: AriaRole, name: impl Into<String>) -> Self {
        Self::from_by(By::Role {
            role,
            name: Some(name.into()),
        })
        .exact()
    }

    pub fn button(name: impl Into<String>) -> Self {
        Self::named(AriaRole::Button, name)
    }

    pub fn textbox(name: impl Into<String>) -> Self {
        Self::named(AriaRole::Textbox, name)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_by(By::Text { text: text.into() })
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::from_by(By::Label { text: text.into() })
    }

    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::from_by(By::Placeholder { text: text.into() })
    }

    pub fn test_id(id: impl Into<String>) -> Self {
        Self::from_by(By::TestId { id: id.into() })
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_by(By::Css {
            selector: selector.into(),
        })
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn substring(mut self) -> Self {
        self.exact = false;
        self
    }

    /// Keep only matches that contain `text` somewhere inside
    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        self.has_text = Some(text.into());
        self
    }

    pub fn nth(mut self, index: i32) -> Self {
        self.nth = Some(index);
        self
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Resolve this locator inside `scope`
    pub fn within(mut self, scope: Locator) -> Self {
        self.within = Some(Box::new(scope));
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.within {
            write!(f, "{} >> ", scope)?;
        }
        match &self.by {
            By::Role { role, name: Some(name) } => write!(f, "{}[name={:?}]", role.as_str(), name)?,
            By::Role { role, name: None } => write!(f, "{}", role.as_str())?,
            By::Text { text } => write!(f, "text={:?}", text)?,
            By::Label { text } => write!(f, "label={:?}", text)?,
            By::Placeholder { text } => write!(f, "placeholder={:?}", text)?,
            By::TestId { id } => write!(f, "testid={:?}", id)?,
            By::Css { selector } => write!(f, "css={}", selector)?,
        }
        if let Some(text) = &self.has_text {
            write!(f, "[has-text={:?}]", text)?;
        }
        if let Some(n) = self.nth {
            write!(f, "[{}]", n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn named_role_serializes_flat() {
        let loc = Locator::button("저장");
        assert_eq!(
            serde_json::to_value(&loc).unwrap(),
            json!({ "by": "role", "role": "button", "name": "저장", "exact": true })
        );
    }

    #[test]
    fn scoped_locator_nests_scope() {
        let row = Locator::role(AriaRole::Row).has_text("홍길동");
        let loc = Locator::role(AriaRole::Checkbox).within(row).first();
        assert_eq!(
            serde_json::to_value(&loc).unwrap(),
            json!({
                "by": "role",
                "role": "checkbox",
                "exact": false,
                "nth": 0,
                "within": { "by": "role", "role": "row", "exact": false, "has_text": "홍길동" }
            })
        );
    }

    #[test]
    fn display_is_readable() {
        let loc = Locator::named(AriaRole::Treeitem, "본관").within(Locator::role(AriaRole::Tree));
        assert_eq!(loc.to_string(), r#"tree >> treeitem[name="본관"]"#);
        assert_eq!(Locator::css("input[type=file]").to_string(), "css=input[type=file]");
    }

    #[test]
    fn roundtrips_through_json() {
        let loc = Locator::placeholder("검색").has_text("x").nth(2);
        let back: Locator = serde_json::from_value(serde_json::to_value(&loc).unwrap()).unwrap();
        assert_eq!(back, loc);
    }
}
