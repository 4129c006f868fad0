use std::collections::BTreeMap;

/// Current value of every placeholder, keyed by name.
pub(crate) type Values = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum VariableType {
    #[default]
    Text,
    Textarea,
    Date,
    Select,
}

/// Declared metadata for a placeholder. Descriptive only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Variable {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) kind: VariableType,
    pub(crate) required: bool,
    pub(crate) options: Vec<String>,
}

impl Variable {
    pub(crate) fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Template {
    pub(crate) id: u64,
    pub(crate) title: String,
    pub(crate) trigger: String,
    pub(crate) content: String,
    pub(crate) team_id: Option<u64>,
    pub(crate) is_active: bool,
    pub(crate) usage_count: u64,
    pub(crate) variables: Vec<Variable>,
}

impl Template {
    pub(crate) fn declared(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.name == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Team {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) description: String,
}

#[derive(Clone, Debug)]
pub(crate) struct TreeItem {
    pub(crate) label: String,
    pub(crate) depth: usize,
    pub(crate) template_id: Option<u64>,
}

/// One editable input in the confirmation form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Field {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) kind: VariableType,
    pub(crate) required: bool,
    pub(crate) options: Vec<String>,
    pub(crate) value: String,
}
