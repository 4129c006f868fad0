//! Identifier-keyed record storage.
//!
//! `Store` is the persistence seam; `MemoryStore` keeps everything in a
//! `BTreeMap` and is what the application runs on.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{Team, Template, Variable, VariableType};

pub(crate) const PERSONAL_TEAM: &str = "Personal";

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },
    #[error("{kind} is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("trigger `{0}` is already used by another template")]
    DuplicateTrigger(String),
}

pub(crate) trait Record: Clone {
    const KIND: &'static str;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);

    fn validate(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(crate) trait Store<R: Record> {
    fn list(&self) -> Vec<R>;

    fn get(&self, id: u64) -> Result<R, StoreError>;

    /// Assigns a fresh id and stores the record.
    fn create(&mut self, record: R) -> Result<R, StoreError>;

    /// Replaces the stored record with the same id.
    fn update(&mut self, record: R) -> Result<R, StoreError>;

    fn delete(&mut self, id: u64) -> Result<R, StoreError>;
}

#[derive(Clone, Debug)]
pub(crate) struct MemoryStore<R> {
    records: BTreeMap<u64, R>,
    next_id: u64,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<R: Record> Store<R> for MemoryStore<R> {
    fn list(&self) -> Vec<R> {
        self.records.values().cloned().collect()
    }

    fn get(&self, id: u64) -> Result<R, StoreError> {
        self.records.get(&id).cloned().ok_or(StoreError::NotFound {
            kind: R::KIND,
            id,
        })
    }

    fn create(&mut self, mut record: R) -> Result<R, StoreError> {
        record.validate()?;
        let id = self.next_id;
        self.next_id += 1;
        record.set_id(id);
        self.records.insert(id, record.clone());
        tracing::debug!(kind = R::KIND, id, "record created");
        Ok(record)
    }

    fn update(&mut self, record: R) -> Result<R, StoreError> {
        record.validate()?;
        let id = record.id();
        let slot = self.records.get_mut(&id).ok_or(StoreError::NotFound {
            kind: R::KIND,
            id,
        })?;
        *slot = record.clone();
        tracing::debug!(kind = R::KIND, id, "record updated");
        Ok(record)
    }

    fn delete(&mut self, id: u64) -> Result<R, StoreError> {
        let record = self.records.remove(&id).ok_or(StoreError::NotFound {
            kind: R::KIND,
            id,
        })?;
        tracing::debug!(kind = R::KIND, id, "record deleted");
        Ok(record)
    }
}

fn require(kind: &'static str, field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::MissingField { kind, field });
    }
    Ok(())
}

impl Record for Template {
    const KIND: &'static str = "template";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), StoreError> {
        require(Self::KIND, "trigger", &self.trigger)?;
        require(Self::KIND, "title", &self.title)?;
        require(Self::KIND, "content", &self.content)
    }
}

impl Record for Team {
    const KIND: &'static str = "team";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), StoreError> {
        require(Self::KIND, "name", &self.name)
    }
}

/// Templates and the teams they belong to.
#[derive(Clone, Debug, Default)]
pub(crate) struct Workspace {
    pub(crate) templates: MemoryStore<Template>,
    pub(crate) teams: MemoryStore<Team>,
}

impl Workspace {
    /// Stores a new template under its trimmed trigger.
    pub(crate) fn create_template(&mut self, mut template: Template) -> Result<Template, StoreError> {
        template.trigger = template.trigger.trim().to_string();
        if self.find_by_trigger(&template.trigger).is_some() {
            return Err(StoreError::DuplicateTrigger(template.trigger));
        }
        self.templates.create(template)
    }

    pub(crate) fn find_by_trigger(&self, trigger: &str) -> Option<Template> {
        let trigger = trigger.trim();
        self.templates
            .records
            .values()
            .find(|template| template.trigger == trigger)
            .cloned()
    }

    /// Case-insensitive match on title, trigger or content.
    pub(crate) fn search(&self, query: &str, include_inactive: bool) -> Vec<Template> {
        let needle = query.trim().to_lowercase();
        self.templates
            .list()
            .into_iter()
            .filter(|template| include_inactive || template.is_active)
            .filter(|template| {
                needle.is_empty()
                    || template.title.to_lowercase().contains(&needle)
                    || template.trigger.to_lowercase().contains(&needle)
                    || template.content.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub(crate) fn record_usage(&mut self, id: u64) -> Result<Template, StoreError> {
        let mut template = self.templates.get(id)?;
        template.usage_count += 1;
        let template = self.templates.update(template)?;
        tracing::info!(id, trigger = %template.trigger, uses = template.usage_count, "template used");
        Ok(template)
    }

    pub(crate) fn toggle_active(&mut self, id: u64) -> Result<Template, StoreError> {
        let mut template = self.templates.get(id)?;
        template.is_active = !template.is_active;
        self.templates.update(template)
    }

    pub(crate) fn team_name(&self, team_id: Option<u64>) -> &str {
        team_id
            .and_then(|id| self.teams.records.get(&id))
            .map(|team| team.name.as_str())
            .unwrap_or(PERSONAL_TEAM)
    }

    /// A workspace pre-filled with sample teams and templates.
    pub(crate) fn demo() -> Result<Self, StoreError> {
        let mut workspace = Self::default();
        let marketing = workspace.teams.create(Team {
            name: "Marketing".to_string(),
            description: "Campaigns, newsletters and launch mail".to_string(),
            ..Team::default()
        })?;
        let support = workspace.teams.create(Team {
            name: "Support".to_string(),
            description: "Customer tickets and follow-ups".to_string(),
            ..Team::default()
        })?;

        workspace.create_template(Template {
            title: "Greeting".to_string(),
            trigger: "/hello".to_string(),
            content: "Hi {name}, thanks for reaching out! I'll get back to you by {day}.".to_string(),
            is_active: true,
            variables: vec![
                text_variable("name", "Recipient", true),
                Variable {
                    name: "day".to_string(),
                    label: "Reply day".to_string(),
                    kind: VariableType::Date,
                    ..Variable::default()
                },
            ],
            ..Template::default()
        })?;
        workspace.create_template(Template {
            title: "Ticket follow-up".to_string(),
            trigger: "/ticket".to_string(),
            content: "Hello {customer},\n\nYour ticket {ticket} is now {status}. \
                      Reference {ticket} in any reply.\n\n{notes}"
                .to_string(),
            team_id: Some(support.id),
            is_active: true,
            variables: vec![
                text_variable("customer", "Customer", true),
                text_variable("ticket", "Ticket number", true),
                Variable {
                    name: "status".to_string(),
                    label: "Status".to_string(),
                    kind: VariableType::Select,
                    required: true,
                    options: vec![
                        "open".to_string(),
                        "in progress".to_string(),
                        "resolved".to_string(),
                    ],
                },
                Variable {
                    name: "notes".to_string(),
                    label: "Notes".to_string(),
                    kind: VariableType::Textarea,
                    ..Variable::default()
                },
            ],
            ..Template::default()
        })?;
        workspace.create_template(Template {
            title: "Campaign email".to_string(),
            trigger: "@campaign".to_string(),
            content: "Subject: {subject}\n\nDear {name},\n{body}\n\nThe {team} team".to_string(),
            team_id: Some(marketing.id),
            is_active: true,
            ..Template::default()
        })?;
        workspace.create_template(Template {
            title: "Monthly report".to_string(),
            trigger: "/report".to_string(),
            content: "Report for {month}: {summary}".to_string(),
            team_id: Some(marketing.id),
            is_active: false,
            ..Template::default()
        })?;
        Ok(workspace)
    }
}

fn text_variable(name: &str, label: &str, required: bool) -> Variable {
    Variable {
        name: name.to_string(),
        label: label.to_string(),
        required,
        ..Variable::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(trigger: &str, title: &str, content: &str) -> Template {
        Template {
            title: title.to_string(),
            trigger: trigger.to_string(),
            content: content.to_string(),
            is_active: true,
            ..Template::default()
        }
    }

    #[test]
    fn create_assigns_increasing_ids() {
        let mut store: MemoryStore<Template> = MemoryStore::default();
        let first = store.create(template("/a", "A", "a")).unwrap();
        let second = store.create(template("/b", "B", "b")).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.get(2).unwrap().title, "B");
    }

    #[test]
    fn create_rejects_blank_required_fields() {
        let mut store: MemoryStore<Template> = MemoryStore::default();
        let err = store.create(template("/a", "  ", "a")).unwrap_err();
        assert_eq!(
            err,
            StoreError::MissingField {
                kind: "template",
                field: "title"
            }
        );
        assert!(store.list().is_empty());
        assert_eq!(
            err.to_string(),
            "template is missing required field `title`"
        );
    }

    #[test]
    fn update_and_delete_unknown_ids_fail() {
        let mut store: MemoryStore<Template> = MemoryStore::default();
        let mut ghost = template("/g", "Ghost", "boo");
        ghost.id = 42;
        assert_eq!(
            store.update(ghost).unwrap_err(),
            StoreError::NotFound {
                kind: "template",
                id: 42
            }
        );
        assert!(store.delete(42).is_err());
        assert_eq!(store.get(42).unwrap_err().to_string(), "template 42 not found");
    }

    #[test]
    fn update_replaces_and_delete_removes() {
        let mut store: MemoryStore<Template> = MemoryStore::default();
        let mut created = store.create(template("/a", "A", "a")).unwrap();
        created.title = "Renamed".to_string();
        store.update(created.clone()).unwrap();
        assert_eq!(store.get(created.id).unwrap().title, "Renamed");
        let removed = store.delete(created.id).unwrap();
        assert_eq!(removed.title, "Renamed");
        assert!(store.get(created.id).is_err());
    }

    #[test]
    fn duplicate_triggers_are_rejected() {
        let mut workspace = Workspace::default();
        workspace.create_template(template("/a", "A", "a")).unwrap();
        let err = workspace.create_template(template("/a", "Again", "b")).unwrap_err();
        assert_eq!(err, StoreError::DuplicateTrigger("/a".to_string()));
    }

    #[test]
    fn triggers_are_stored_trimmed() {
        let mut workspace = Workspace::default();
        let created = workspace.create_template(template(" /a ", "A", "a")).unwrap();
        assert_eq!(created.trigger, "/a");
        assert_eq!(workspace.find_by_trigger("/a ").unwrap().id, created.id);
        assert_eq!(workspace.find_by_trigger("/a").unwrap().id, created.id);
        let err = workspace.create_template(template("/a\t", "B", "b")).unwrap_err();
        assert_eq!(err, StoreError::DuplicateTrigger("/a".to_string()));
    }

    #[test]
    fn record_usage_increments_counter() {
        let mut workspace = Workspace::default();
        let created = workspace.create_template(template("/a", "A", "a")).unwrap();
        workspace.record_usage(created.id).unwrap();
        let used = workspace.record_usage(created.id).unwrap();
        assert_eq!(used.usage_count, 2);
        assert_eq!(workspace.templates.get(created.id).unwrap().usage_count, 2);
        assert!(workspace.record_usage(99).is_err());
    }

    #[test]
    fn search_matches_title_trigger_or_content() {
        let mut workspace = Workspace::default();
        workspace
            .create_template(template("/hello", "Greeting", "Hi {name}"))
            .unwrap();
        workspace
            .create_template(template("@sig", "Signature", "Best regards"))
            .unwrap();
        let mut hidden = template("/old", "Old greeting", "Howdy");
        hidden.is_active = false;
        workspace.create_template(hidden).unwrap();

        let titles = |found: Vec<Template>| -> Vec<String> {
            found.into_iter().map(|template| template.title).collect()
        };
        assert_eq!(titles(workspace.search("GREET", false)), vec!["Greeting"]);
        assert_eq!(titles(workspace.search("@SIG", false)), vec!["Signature"]);
        assert_eq!(titles(workspace.search("regards", false)), vec!["Signature"]);
        assert_eq!(
            titles(workspace.search("greet", true)),
            vec!["Greeting", "Old greeting"]
        );
        assert_eq!(workspace.search("", false).len(), 2);
    }

    #[test]
    fn toggle_active_flips_flag() {
        let mut workspace = Workspace::default();
        let created = workspace.create_template(template("/a", "A", "a")).unwrap();
        assert!(!workspace.toggle_active(created.id).unwrap().is_active);
        assert!(workspace.toggle_active(created.id).unwrap().is_active);
    }

    #[test]
    fn team_names_fall_back_to_personal() {
        let workspace = Workspace::demo().unwrap();
        assert_eq!(workspace.team_name(None), PERSONAL_TEAM);
        assert_eq!(workspace.team_name(Some(999)), PERSONAL_TEAM);
        assert_eq!(workspace.team_name(Some(1)), "Marketing");
    }

    #[test]
    fn demo_teams_carry_descriptions() {
        let workspace = Workspace::demo().unwrap();
        let teams = workspace.teams.list();
        assert_eq!(teams.len(), 2);
        assert!(teams.iter().all(|team| !team.description.is_empty()));
        assert_eq!(teams[1].description, "Customer tickets and follow-ups");
    }

    #[test]
    fn demo_workspace_is_consistent() {
        let workspace = Workspace::demo().unwrap();
        let ticket = workspace.find_by_trigger("/ticket").unwrap();
        assert_eq!(workspace.team_name(ticket.team_id), "Support");
        assert!(ticket.declared("status").is_some());
        assert!(workspace.find_by_trigger("/report").is_some());
        assert_eq!(workspace.search("", false).len(), 3);
    }
}
