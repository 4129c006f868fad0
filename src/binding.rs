use crate::models::{Field, Segment, Template, Values};
use crate::parser::{parse_segments, placeholder_names};

/// Editable fields for the placeholders of one template content.
///
/// Fields are keyed by placeholder name, so repeated occurrences of a name
/// share a single value. Re-binding the same content keeps the values typed
/// so far; binding different content starts over from empty fields.
#[derive(Clone, Debug, Default)]
pub(crate) struct Bindings {
    source: Option<String>,
    segments: Vec<Segment>,
    fields: Vec<Field>,
}

impl Bindings {
    pub(crate) fn for_template(template: &Template) -> Self {
        let mut bindings = Self::default();
        bindings.bind(template);
        bindings
    }

    pub(crate) fn bind(&mut self, template: &Template) {
        if self.source.as_deref() != Some(template.content.as_str()) {
            self.fields.clear();
            self.segments = parse_segments(&template.content);
            self.source = Some(template.content.clone());
        }

        for name in placeholder_names(&self.segments) {
            if self.fields.iter().any(|field| field.name == name) {
                continue;
            }
            let declared = template.declared(name);
            self.fields.push(Field {
                name: name.to_string(),
                label: declared
                    .map(|variable| variable.display_label().to_string())
                    .unwrap_or_else(|| name.to_string()),
                kind: declared.map(|variable| variable.kind).unwrap_or_default(),
                required: declared.is_some_and(|variable| variable.required),
                options: declared
                    .map(|variable| variable.options.clone())
                    .unwrap_or_default(),
                value: String::new(),
            });
        }
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn field_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.fields.get_mut(index)
    }

    pub(crate) fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
            .unwrap_or("")
    }

    /// Sets the value for `name`. Returns false when no such placeholder is bound.
    pub(crate) fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    pub(crate) fn values(&self) -> Values {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect()
    }
}

impl Field {
    /// Moves to the next (or previous) declared option, wrapping around.
    pub(crate) fn cycle_option(&mut self, forward: bool) {
        if self.options.is_empty() {
            return;
        }
        let len = self.options.len();
        let next = match self.options.iter().position(|option| *option == self.value) {
            Some(current) if forward => (current + 1) % len,
            Some(current) => (current + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.value = self.options[next].clone();
    }
}
