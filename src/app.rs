use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use ratatui::widgets::ListState;

use crate::binding::Bindings;
use crate::command::CommandListener;
use crate::config::{InsertMode, MerlinConfig};
use crate::models::{Template, TreeItem};
use crate::parser::{build_tree_items, substitute};
use crate::store::{Store, Workspace};
use crate::system::set_clipboard;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum View {
    List,
    Confirm,
}

#[derive(Clone, Debug)]
pub(crate) struct StatusMessage {
    pub(crate) text: String,
    pub(crate) since: Instant,
}

/// The fill-in form for one template.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmState {
    pub(crate) template: Template,
    pub(crate) bindings: Bindings,
    pub(crate) active_field: usize,
    pub(crate) field_scroll: usize,
    pub(crate) status: Option<StatusMessage>,
}

#[derive(Debug)]
pub(crate) struct App {
    pub(crate) workspace: Workspace,
    pub(crate) insert_mode: InsertMode,
    pub(crate) show_inactive: bool,
    pub(crate) status_duration: Duration,
    double_click: Duration,
    listener: CommandListener,
    pub(crate) query: String,
    pub(crate) visible: Vec<Template>,
    pub(crate) tree_items: Vec<TreeItem>,
    pub(crate) list_state: ListState,
    pub(crate) list_scroll: usize,
    pub(crate) view: View,
    pub(crate) confirm: Option<ConfirmState>,
    pub(crate) last_click: Option<(usize, Instant)>,
    pub(crate) tree_area: Rect,
    pub(crate) should_quit: bool,
    pub(crate) list_status: Option<StatusMessage>,
    output: Option<String>,
}

impl App {
    pub(crate) fn new(workspace: Workspace, config: &MerlinConfig) -> Self {
        let mut app = Self {
            workspace,
            insert_mode: config.insert_mode,
            show_inactive: config.show_inactive,
            status_duration: Duration::from_millis(config.status_duration_ms),
            double_click: Duration::from_millis(config.double_click_ms),
            listener: CommandListener::new(&config.command),
            query: String::new(),
            visible: Vec::new(),
            tree_items: Vec::new(),
            list_state: ListState::default(),
            list_scroll: 0,
            view: View::List,
            confirm: None,
            last_click: None,
            tree_area: Rect::default(),
            should_quit: false,
            list_status: None,
            output: None,
        };
        app.refresh();
        app
    }

    /// Text waiting to be printed once the terminal is restored.
    pub(crate) fn take_output(&mut self) -> Option<String> {
        self.output.take()
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) {
        match self.view {
            View::List => self.on_key_list(key),
            View::Confirm => self.on_key_confirm(key),
        }
    }

    pub(crate) fn on_mouse(&mut self, mouse: MouseEvent) {
        match self.view {
            View::List => self.on_mouse_list(mouse),
            View::Confirm => {}
        }
    }

    fn on_key_list(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc if self.query.is_empty() => self.should_quit = true,
            KeyCode::Esc => {
                self.query.clear();
                self.search_changed();
            }
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('a') if ctrl => self.toggle_selected(),
            KeyCode::Char('d') if ctrl => self.delete_selected(),
            KeyCode::Down => self.move_list(1),
            KeyCode::Up => self.move_list(-1),
            KeyCode::Enter => self.open_selected_template(),
            KeyCode::Backspace => {
                self.query.pop();
                self.search_changed();
            }
            KeyCode::Char(ch) if !ctrl => {
                self.query.push(ch);
                if self.listener.feed(ch, Instant::now()) {
                    self.summon();
                } else {
                    self.search_changed();
                }
            }
            _ => {}
        }
    }

    fn on_mouse_list(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        if let Some(index) = self.row_at(mouse) {
            self.list_state.select(Some(index));
            let now = Instant::now();
            if let Some((last_index, last_time)) = self.last_click {
                if last_index == index && now.duration_since(last_time) <= self.double_click {
                    self.open_selected_template();
                }
            }
            self.last_click = Some((index, now));
        }
    }

    fn on_key_confirm(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let Some(confirm) = self.confirm.as_mut() else {
            self.view = View::List;
            return;
        };

        match key.code {
            KeyCode::Esc => {
                self.back_to_list();
            }
            KeyCode::Tab | KeyCode::Down => confirm.next_field(),
            KeyCode::BackTab | KeyCode::Up => confirm.prev_field(),
            KeyCode::Right => confirm.cycle_option(true),
            KeyCode::Left => confirm.cycle_option(false),
            KeyCode::Backspace => confirm.backspace(),
            KeyCode::Enter => self.confirm_insert(),
            KeyCode::Char('c') if ctrl => self.copy_preview(),
            KeyCode::Char(ch) if !ctrl => {
                confirm.push_char(ch);
                // the open form is dropped along with the typed sequence
                if self.listener.feed(ch, Instant::now()) {
                    self.summon();
                }
            }
            _ => {}
        }
    }

    /// Re-runs the search and rebuilds the team tree.
    pub(crate) fn refresh(&mut self) {
        self.visible = self.workspace.search(&self.query, self.show_inactive);
        let workspace = &self.workspace;
        self.tree_items = build_tree_items(&self.visible, |team_id| workspace.team_name(team_id));

        let selected = self
            .list_state
            .selected()
            .filter(|index| *index < self.tree_items.len())
            .or_else(|| self.first_template_row());
        self.list_state.select(selected);
    }

    fn search_changed(&mut self) {
        self.list_state.select(None);
        self.refresh();
    }

    /// Opens a fresh picker: empty search, first template selected.
    fn summon(&mut self) {
        tracing::debug!(sequence = self.listener.sequence(), "picker summoned");
        self.query.clear();
        self.back_to_list();
        self.search_changed();
    }

    fn first_template_row(&self) -> Option<usize> {
        self.tree_items
            .iter()
            .position(|item| item.template_id.is_some())
    }

    fn selected_template_id(&self) -> Option<u64> {
        let index = self.list_state.selected()?;
        self.tree_items.get(index)?.template_id
    }

    fn move_list(&mut self, delta: isize) {
        let len = self.tree_items.len();
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, (len - 1) as isize) as usize;
        self.list_state.select(Some(next));
    }

    fn open_selected_template(&mut self) {
        let Some(id) = self.selected_template_id() else {
            return;
        };
        let template = match self.visible.iter().find(|template| template.id == id) {
            Some(template) => template.clone(),
            None => return,
        };
        tracing::debug!(id, trigger = %template.trigger, "opening template");
        self.confirm = Some(ConfirmState::new(template));
        self.listener.reset();
        self.view = View::Confirm;
    }

    fn back_to_list(&mut self) {
        self.confirm = None;
        self.listener.reset();
        self.view = View::List;
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.selected_template_id() else {
            return;
        };
        match self.workspace.toggle_active(id) {
            Ok(template) => {
                let state = if template.is_active { "active" } else { "inactive" };
                self.set_list_status(&format!("{} is now {state}", template.title));
            }
            Err(err) => self.set_list_status(&err.to_string()),
        }
        self.refresh();
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_template_id() else {
            return;
        };
        match self.workspace.templates.delete(id) {
            Ok(template) => self.set_list_status(&format!("Deleted {}", template.title)),
            Err(err) => self.set_list_status(&err.to_string()),
        }
        self.refresh();
    }

    fn copy_preview(&mut self) {
        let Some(confirm) = self.confirm.as_mut() else {
            return;
        };
        let rendered = substitute(&confirm.template.content, &confirm.bindings.values());
        match set_clipboard(&rendered) {
            Ok(()) => confirm.set_status("Copied"),
            Err(err) => confirm.set_status(&format!("{err:#}")),
        }
    }

    /// Fills the template, delivers the text and counts the use.
    fn confirm_insert(&mut self) {
        let Some(confirm) = self.confirm.as_mut() else {
            return;
        };
        let output = substitute(&confirm.template.content, &confirm.bindings.values());
        let id = confirm.template.id;
        let title = confirm.template.title.clone();

        match self.insert_mode {
            InsertMode::Clipboard => {
                if let Err(err) = set_clipboard(&output) {
                    tracing::warn!("clipboard insert failed: {err:#}");
                    confirm.set_status(&format!("{err:#}"));
                    return;
                }
            }
            InsertMode::Stdout => {
                self.output = Some(output);
                self.should_quit = true;
            }
        }

        if let Err(err) = self.workspace.record_usage(id) {
            tracing::warn!(id, error = %err, "failed to record usage");
        }
        self.back_to_list();
        self.set_list_status(&format!("Inserted {title}"));
        self.refresh();
    }

    fn set_list_status(&mut self, text: &str) {
        self.list_status = Some(StatusMessage {
            text: text.to_string(),
            since: Instant::now(),
        });
    }

    /// Tree row under the pointer, if any.
    fn row_at(&self, mouse: MouseEvent) -> Option<usize> {
        let area = self.tree_area;
        if !area.contains(Position::new(mouse.column, mouse.row)) {
            return None;
        }
        let index = self.list_scroll + usize::from(mouse.row - area.y);
        (index < self.tree_items.len()).then_some(index)
    }
}

impl ConfirmState {
    fn new(template: Template) -> Self {
        let bindings = Bindings::for_template(&template);
        Self {
            template,
            bindings,
            active_field: 0,
            field_scroll: 0,
            status: None,
        }
    }

    pub(crate) fn active_name(&self) -> Option<&str> {
        self.bindings
            .fields()
            .get(self.active_field)
            .map(|field| field.name.as_str())
    }

    fn next_field(&mut self) {
        let len = self.bindings.fields().len();
        if len == 0 {
            return;
        }
        self.active_field = (self.active_field + 1) % len;
    }

    fn prev_field(&mut self) {
        let len = self.bindings.fields().len();
        if len == 0 {
            return;
        }
        if self.active_field == 0 {
            self.active_field = len - 1;
        } else {
            self.active_field -= 1;
        }
    }

    fn push_char(&mut self, ch: char) {
        if let Some(field) = self.bindings.field_mut(self.active_field) {
            field.value.push(ch);
        }
    }

    fn backspace(&mut self) {
        if let Some(field) = self.bindings.field_mut(self.active_field) {
            field.value.pop();
        }
    }

    fn cycle_option(&mut self, forward: bool) {
        if let Some(field) = self.bindings.field_mut(self.active_field) {
            field.cycle_option(forward);
        }
    }

    fn set_status(&mut self, text: &str) {
        self.status = Some(StatusMessage {
            text: text.to_string(),
            since: Instant::now(),
        });
    }
}
