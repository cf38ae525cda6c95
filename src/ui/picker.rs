//! Series picker shown before the dashboard
//!
//! Lists every sample from the initial scrape. Space toggles a series, enter
//! confirms the selection and `/` starts filtering by identifier.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::source::MetricSample;

/// Outcome of a key press in the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerAction {
    None,
    /// Selected identifiers, in listing order
    Confirm(Vec<String>),
    Quit,
}

#[derive(Debug, Clone)]
struct PickerItem {
    name: String,
    help: String,
    selected: bool,
}

pub struct Picker {
    items: Vec<PickerItem>,
    filter: String,
    filtering: bool,
    list_state: ListState,
}

impl Picker {
    pub fn new(samples: &[MetricSample]) -> Self {
        let items = samples
            .iter()
            .map(|s| PickerItem {
                name: s.name.clone(),
                help: s.help.clone(),
                selected: false,
            })
            .collect::<Vec<_>>();

        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            items,
            filter: String::new(),
            filtering: false,
            list_state,
        }
    }

    /// Indices of items matching the current filter
    fn visible(&self) -> Vec<usize> {
        let needle = self.filter.to_lowercase();
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| needle.is_empty() || item.name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.name.clone())
            .collect()
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) -> PickerAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return PickerAction::Quit;
        }

        if self.filtering {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.filtering = false,
                KeyCode::Backspace => {
                    self.filter.pop();
                    self.reset_cursor();
                }
                KeyCode::Char(c) => {
                    self.filter.push(c);
                    self.reset_cursor();
                }
                _ => {}
            }
            return PickerAction::None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return PickerAction::Quit,
            KeyCode::Char('/') => self.filtering = true,
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Enter => {
                let selected = self.selected_names();
                if !selected.is_empty() {
                    return PickerAction::Confirm(selected);
                }
            }
            _ => {}
        }
        PickerAction::None
    }

    fn reset_cursor(&mut self) {
        let any = !self.visible().is_empty();
        self.list_state.select(if any { Some(0) } else { None });
    }

    fn move_cursor(&mut self, delta: isize) {
        let count = self.visible().len();
        if count == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, count as isize - 1);
        self.list_state.select(Some(next as usize));
    }

    fn toggle_current(&mut self) {
        let visible = self.visible();
        if let Some(&index) = self
            .list_state
            .selected()
            .and_then(|cursor| visible.get(cursor))
        {
            self.items[index].selected = !self.items[index].selected;
        }
    }

    /// Render the UI
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_filter(f, chunks[0]);
        self.render_list(f, chunks[1]);

        let help = Paragraph::new(Span::styled(
            "space: toggle | enter: graph selected | /: filter | q: quit",
            Style::default().fg(Color::DarkGray),
        ));
        f.render_widget(help, chunks[2]);
    }

    fn render_filter(&self, f: &mut Frame, area: Rect) {
        let style = if self.filtering {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let line = Line::from(vec![
            Span::raw("Filter: "),
            Span::styled(self.filter.clone(), style),
            Span::raw(format!("  ({} selected)", self.selected_names().len())),
        ]);
        let paragraph = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select metrics to graph"),
        );
        f.render_widget(paragraph, area);
    }

    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .visible()
            .into_iter()
            .map(|i| {
                let item = &self.items[i];
                let mark = if item.selected { "x" } else { " " };
                ListItem::new(vec![
                    Line::from(format!("[{}] {}", mark, item.name)),
                    Line::from(Span::styled(
                        format!("    {}", item.help),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        f.render_stateful_widget(list, area, &mut self.list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn picker() -> Picker {
        let samples: Vec<MetricSample> = ["cpu_usage", "memory_bytes", "queue_depth"]
            .iter()
            .map(|n| MetricSample::new(n.to_string(), vec![], 1.0, format!("{} help", n)))
            .collect();
        Picker::new(&samples)
    }

    #[test]
    fn test_toggle_and_confirm() {
        let mut picker = picker();
        assert_eq!(picker.handle_key(key(KeyCode::Char(' '))), PickerAction::None);
        picker.handle_key(key(KeyCode::Down));
        picker.handle_key(key(KeyCode::Down));
        picker.handle_key(key(KeyCode::Char(' ')));

        assert_eq!(
            picker.handle_key(key(KeyCode::Enter)),
            PickerAction::Confirm(vec!["cpu_usage".to_string(), "queue_depth".to_string()])
        );
    }

    #[test]
    fn test_enter_without_selection_stays() {
        let mut picker = picker();
        assert_eq!(picker.handle_key(key(KeyCode::Enter)), PickerAction::None);
    }

    #[test]
    fn test_toggle_twice_deselects() {
        let mut picker = picker();
        picker.handle_key(key(KeyCode::Char(' ')));
        picker.handle_key(key(KeyCode::Char(' ')));
        assert!(picker.selected_names().is_empty());
    }

    #[test]
    fn test_filter_narrows_list() {
        let mut picker = picker();
        picker.handle_key(key(KeyCode::Char('/')));
        for c in "mem".chars() {
            picker.handle_key(key(KeyCode::Char(c)));
        }
        // q while filtering is text, not quit
        assert_eq!(picker.handle_key(key(KeyCode::Char('q'))), PickerAction::None);
        picker.handle_key(key(KeyCode::Backspace));
        picker.handle_key(key(KeyCode::Enter));
        picker.handle_key(key(KeyCode::Char(' ')));

        assert_eq!(picker.selected_names(), vec!["memory_bytes".to_string()]);
    }

    #[test]
    fn test_quit_keys() {
        let mut picker = picker();
        assert_eq!(picker.handle_key(key(KeyCode::Char('q'))), PickerAction::Quit);
        assert_eq!(picker.handle_key(key(KeyCode::Esc)), PickerAction::Quit);
        assert_eq!(
            picker.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            PickerAction::Quit
        );
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut picker = picker();
        picker.handle_key(key(KeyCode::Up));
        assert_eq!(picker.list_state.selected(), Some(0));
        for _ in 0..10 {
            picker.handle_key(key(KeyCode::Down));
        }
        assert_eq!(picker.list_state.selected(), Some(2));
    }

    #[test]
    fn test_render_lists_items() {
        let mut picker = picker();
        picker.handle_key(key(KeyCode::Char(' ')));

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| picker.render(f)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();

        assert!(text.contains("Select metrics to graph"));
        assert!(text.contains("[x] cpu_usage"));
        assert!(text.contains("[ ] memory_bytes"));
    }
}
