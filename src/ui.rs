use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use log::{debug, warn};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tui_input::{backend::crossterm::EventHandler, Input};

use palaver::client::Router;
use palaver::models::{DeliveryStatus, MessageType};
use palaver::notify::{Notice, Severity};
use palaver::store::FileAttachment;
use palaver::view::{self, ContactRow, MessageBody, MessagePaneView, SidebarView};
use palaver::{CallState, SessionState};

use crate::utils;

// Export types needed by main module
pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Debounce window for the contact search box, matching the original client.
const SEARCH_DEBOUNCE_MS: i64 = 500;
/// Typing notifications stop after this much input silence.
const TYPING_STOP_MS: i64 = 1000;
/// How long a notice toast stays on screen.
const NOTICE_DISMISS_SECS: i64 = 4;

enum Tab {
    Messages,
    Contacts,
}

/// Destructive actions require an explicit confirmation step.
enum ConfirmAction {
    DeleteMessage(String),
    DeleteChat(String),
}

enum LoginField {
    Name,
    Email,
    Password,
    Confirm,
}

/// Login/register form state.
struct AuthForm {
    registering: bool,
    name: Input,
    email: Input,
    password: Input,
    confirm: Input,
    field: LoginField,
}

impl AuthForm {
    fn new() -> Self {
        AuthForm {
            registering: false,
            name: Input::default(),
            email: Input::default(),
            password: Input::default(),
            confirm: Input::default(),
            field: LoginField::Email,
        }
    }

    fn active_input(&mut self) -> &mut Input {
        match self.field {
            LoginField::Name => &mut self.name,
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
            LoginField::Confirm => &mut self.confirm,
        }
    }

    fn next_field(&mut self) {
        self.field = match (&self.field, self.registering) {
            (LoginField::Name, _) => LoginField::Email,
            (LoginField::Email, _) => LoginField::Password,
            (LoginField::Password, true) => LoginField::Confirm,
            (LoginField::Password, false) => LoginField::Email,
            (LoginField::Confirm, _) => LoginField::Name,
        };
    }
}

pub struct ChatUi {
    input: Input,
    active_tab: Tab,
    contact_index: usize,
    auth_form: AuthForm,
    confirm_dialog: Option<ConfirmAction>,
    attach_dialog: Option<Input>,
    help_visible: bool,
    dark_mode: bool,
    notices: Vec<(Notice, DateTime<Utc>)>,
    notice_rx: mpsc::UnboundedReceiver<Notice>,
    // Search box state; a pending term is emitted once its deadline passes
    // (last call wins).
    search: Input,
    searching: bool,
    search_deadline: Option<DateTime<Utc>>,
    // Typing notification state.
    typing_active: bool,
    typing_deadline: Option<DateTime<Utc>>,
    quit: bool,
}

impl ChatUi {
    pub fn new(notice_rx: mpsc::UnboundedReceiver<Notice>, dark_mode: bool) -> Self {
        ChatUi {
            input: Input::default(),
            active_tab: Tab::Messages,
            contact_index: 0,
            auth_form: AuthForm::new(),
            confirm_dialog: None,
            attach_dialog: None,
            help_visible: false,
            dark_mode,
            notices: Vec::new(),
            notice_rx,
            search: Input::default(),
            searching: false,
            search_deadline: None,
            typing_active: false,
            typing_deadline: None,
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Poll for one key event and apply it. Mutation happens here, before the
    /// next draw reads the store.
    pub fn handle_input(&mut self, router: &mut Router) -> Result<()> {
        if !event::poll(std::time::Duration::from_millis(10))? {
            return Ok(());
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == event::KeyEventKind::Press {
                if matches!(router.session.state(), SessionState::Active(_)) {
                    self.handle_chat_key(key, router);
                } else {
                    self.handle_auth_key(key, router);
                }
            }
        }
        Ok(())
    }

    fn handle_auth_key(&mut self, key: KeyEvent, router: &mut Router) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab => self.auth_form.next_field(),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.auth_form.registering = !self.auth_form.registering;
                self.auth_form.field = if self.auth_form.registering {
                    LoginField::Name
                } else {
                    LoginField::Email
                };
            }
            KeyCode::Enter => {
                let form = &self.auth_form;
                let result = if form.registering {
                    router.session.register(
                        form.name.value(),
                        form.email.value(),
                        form.password.value(),
                        form.confirm.value(),
                    )
                } else {
                    router.session.login(form.email.value(), form.password.value())
                };
                if let Err(e) = result {
                    self.notices.push((
                        Notice {
                            title: "Error".to_string(),
                            message: e.to_string(),
                            severity: Severity::Error,
                        },
                        Utc::now(),
                    ));
                }
            }
            _ => {
                self.auth_form.active_input().handle_event(&Event::Key(key));
            }
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent, router: &mut Router) {
        // Confirmation dialogs swallow everything but y/n.
        if let Some(action) = &self.confirm_dialog {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    match action {
                        ConfirmAction::DeleteMessage(id) => {
                            let id = id.clone();
                            router.store.delete_message(&id);
                        }
                        ConfirmAction::DeleteChat(id) => {
                            let id = id.clone();
                            router.store.delete_chat(&id);
                            self.contact_index = 0;
                        }
                    }
                    self.confirm_dialog = None;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_dialog = None;
                }
                _ => {}
            }
            return;
        }

        // Attach-file dialog: a path prompt.
        if self.attach_dialog.is_some() {
            match key.code {
                KeyCode::Esc => self.attach_dialog = None,
                KeyCode::Enter => {
                    let path = self.attach_dialog.take().map(|i| i.value().to_string());
                    if let Some(path) = path {
                        self.attach_file(PathBuf::from(path.trim()), router);
                    }
                }
                _ => {
                    if let Some(input) = self.attach_dialog.as_mut() {
                        input.handle_event(&Event::Key(key));
                    }
                }
            }
            return;
        }

        if self.help_visible {
            self.help_visible = false;
            return;
        }

        // Incoming call prompt takes precedence over normal input.
        if matches!(router.calls.state(), CallState::Incoming { .. }) {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    let _ = router.calls.answer(Utc::now());
                }
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    let _ = router.calls.reject();
                }
                _ => {}
            }
            return;
        }

        if self.searching {
            match key.code {
                KeyCode::Esc => {
                    self.searching = false;
                    self.search = Input::default();
                    self.search_deadline = None;
                    router.store.clear_search_results();
                }
                KeyCode::Enter => {
                    self.search_deadline = Some(Utc::now());
                    self.flush_search(router, Utc::now());
                }
                _ => {
                    self.search.handle_event(&Event::Key(key));
                    // Last call wins: every keystroke pushes the deadline out.
                    self.search_deadline =
                        Some(Utc::now() + Duration::milliseconds(SEARCH_DEBOUNCE_MS));
                }
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab => {
                self.active_tab = match self.active_tab {
                    Tab::Messages => Tab::Contacts,
                    Tab::Contacts => Tab::Messages,
                };
            }
            KeyCode::Enter => {
                if let Tab::Messages = self.active_tab {
                    let text = self.input.value().to_string();
                    if !text.trim().is_empty() {
                        self.input = Input::default();
                        self.stop_typing(router);
                        if let Err(e) = router.store.send_message(&text) {
                            warn!("Send rejected: {}", e);
                        }
                    }
                } else {
                    self.open_selected_contact(router);
                }
            }
            KeyCode::Up => {
                if let Tab::Contacts = self.active_tab {
                    self.move_contact_cursor(router, -1);
                }
            }
            KeyCode::Down => {
                if let Tab::Contacts = self.active_tab {
                    self.move_contact_cursor(router, 1);
                }
            }
            KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.searching = true;
                self.active_tab = Tab::Contacts;
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                match self.active_tab {
                    Tab::Messages => {
                        // Delete the latest outgoing message.
                        let self_id = router
                            .store
                            .current_user()
                            .map(|u| u.id.clone())
                            .unwrap_or_default();
                        if let Some(id) = router
                            .store
                            .messages()
                            .iter()
                            .rev()
                            .find(|m| m.sender_id == self_id)
                            .map(|m| m.id.clone())
                        {
                            self.confirm_dialog = Some(ConfirmAction::DeleteMessage(id));
                        }
                    }
                    Tab::Contacts => {
                        if let Some(id) = self.selected_contact_id(router) {
                            self.confirm_dialog = Some(ConfirmAction::DeleteChat(id));
                        }
                    }
                }
            }
            KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(id) = self.selected_contact_id(router) {
                    router.store.toggle_pin(&id);
                }
            }
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(id) = self.selected_contact_id(router) {
                    if router.store.is_archived(&id) {
                        router.store.unarchive_chat(&id);
                    } else {
                        router.store.archive_chat(&id);
                    }
                }
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(id) = self.selected_contact_id(router) {
                    router.store.toggle_mute(&id);
                }
            }
            KeyCode::Char('g') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.cycle_media_filter(router);
            }
            KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if router.store.current_contact().is_some() {
                    self.attach_dialog = Some(Input::default());
                }
            }
            KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.start_call(router, palaver::CallKind::Video);
            }
            KeyCode::Char('b') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.start_call(router, palaver::CallKind::Audio);
            }
            KeyCode::Char('k') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let _ = router.calls.end(Utc::now());
            }
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                router.notifier().toggle();
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                router.store.refresh_contacts();
            }
            KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.dark_mode = !self.dark_mode;
                router
                    .store
                    .kv_mut()
                    .set(palaver::storage::keys::DARK_MODE, &self.dark_mode.to_string());
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                router.session.logout(router.store.kv_mut());
                router.store.reset();
                self.auth_form = AuthForm::new();
            }
            KeyCode::Char('h') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.help_visible = true;
            }
            _ => {
                if let Tab::Messages = self.active_tab {
                    self.input.handle_event(&Event::Key(key));
                    self.start_typing(router);
                }
            }
        }
    }

    /// Periodic maintenance driven by the main loop: deadlines, notices, and
    /// pane visibility.
    pub fn tick(&mut self, router: &mut Router) {
        let now = Utc::now();

        while let Ok(notice) = self.notice_rx.try_recv() {
            self.notices.push((notice, now));
        }
        self.notices
            .retain(|(_, at)| (now - *at).num_seconds() < NOTICE_DISMISS_SECS);

        router.calls.expire_stale(now);
        self.flush_search(router, now);

        if self.typing_active && self.typing_deadline.map_or(false, |d| now >= d) {
            self.stop_typing(router);
        }

        // The message pane counts as visible only while it has focus and no
        // popup covers it; that drives the incoming-message notification gate.
        let pane_visible = matches!(self.active_tab, Tab::Messages)
            && self.confirm_dialog.is_none()
            && self.attach_dialog.is_none()
            && !self.help_visible
            && matches!(router.calls.state(), CallState::Idle);
        router.store.set_pane_visible(pane_visible);
    }

    fn flush_search(&mut self, router: &mut Router, now: DateTime<Utc>) {
        if let Some(deadline) = self.search_deadline {
            if now >= deadline {
                self.search_deadline = None;
                let term = self.search.value().trim().to_lowercase();
                if term.is_empty() {
                    router.store.clear_search_results();
                } else {
                    router.store.search_users(&term);
                }
            }
        }
    }

    fn start_typing(&mut self, router: &mut Router) {
        if self.input.value().trim().is_empty() {
            self.stop_typing(router);
            return;
        }
        if !self.typing_active {
            router.store.typing_start();
            self.typing_active = true;
        }
        self.typing_deadline = Some(Utc::now() + Duration::milliseconds(TYPING_STOP_MS));
    }

    fn stop_typing(&mut self, router: &mut Router) {
        if self.typing_active {
            router.store.typing_stop();
            self.typing_active = false;
        }
        self.typing_deadline = None;
    }

    fn start_call(&mut self, router: &mut Router, kind: palaver::CallKind) {
        let peer = match router.store.current_contact() {
            Some(contact) => contact.id.clone(),
            None => {
                debug!("Call attempted with no contact selected");
                return;
            }
        };
        let _ = router.calls.initiate(&peer, kind);
    }

    fn cycle_media_filter(&mut self, router: &mut Router) {
        let next = match router.store.current_media_filter() {
            None => Some(MessageType::Image),
            Some(MessageType::Image) => Some(MessageType::Video),
            Some(MessageType::Video) => Some(MessageType::File),
            Some(MessageType::File) | Some(MessageType::Text) => None,
        };
        match next {
            Some(filter) => {
                let _ = router.store.set_media_filter(filter);
            }
            None => router.store.clear_media_filter(),
        }
    }

    fn attach_file(&mut self, path: PathBuf, router: &mut Router) {
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Failed to read file {}: {}", path.display(), e);
                router.notifier().error("Error", "Failed to read file");
                return;
            }
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let attachment = FileAttachment {
            file_url: path.display().to_string(),
            file_name,
            file_size: utils::format_file_size(metadata.len()),
            message_type: utils::classify_file(&path),
        };
        if let Err(e) = router.store.send_file_message(attachment) {
            warn!("File send rejected: {}", e);
        }
    }

    // The sidebar selection works over the flattened section order
    // (pinned, normal, archived) or the search results while searching.
    fn visible_contact_ids(&self, router: &Router) -> Vec<String> {
        match view::sidebar(&router.store) {
            SidebarView::SearchResults(rows) => rows.into_iter().map(|r| r.id).collect(),
            SidebarView::Contacts(list) => list
                .pinned
                .into_iter()
                .chain(list.normal)
                .chain(list.archived)
                .map(|r| r.id)
                .collect(),
        }
    }

    fn selected_contact_id(&self, router: &Router) -> Option<String> {
        let ids = self.visible_contact_ids(router);
        ids.get(self.contact_index.min(ids.len().saturating_sub(1)))
            .cloned()
    }

    fn move_contact_cursor(&mut self, router: &mut Router, delta: i64) {
        let ids = self.visible_contact_ids(router);
        if ids.is_empty() {
            return;
        }
        let len = ids.len() as i64;
        let index = (self.contact_index as i64 + delta).rem_euclid(len);
        self.contact_index = index as usize;
    }

    fn open_selected_contact(&mut self, router: &mut Router) {
        let searching = router.store.showing_search_results();
        if let Some(id) = self.selected_contact_id(router) {
            if searching {
                if let Some(contact) = router
                    .store
                    .search_results()
                    .iter()
                    .find(|c| c.id == id)
                    .cloned()
                {
                    router.store.start_new_conversation(contact);
                    self.searching = false;
                    self.search = Input::default();
                    self.search_deadline = None;
                }
            } else {
                router.store.switch_contact(&id);
            }
            self.active_tab = Tab::Messages;
        }
    }

    // ---- drawing ----

    pub fn draw<B: Backend>(&mut self, frame: &mut Frame<B>, router: &Router) {
        if matches!(router.session.state(), SessionState::Active(_)) {
            self.draw_chat(frame, router);
        } else {
            self.draw_auth(frame, router);
        }

        let size = frame.size();
        if let Some((notice, _)) = self.notices.last() {
            draw_notice(frame, notice, size);
        }
        if self.help_visible {
            draw_help(frame, size);
        }
    }

    fn draw_auth<B: Backend>(&mut self, frame: &mut Frame<B>, router: &Router) {
        let size = frame.size();
        let area = centered_rect(50, 60, size);
        frame.render_widget(Clear, area);

        let title = if self.auth_form.registering {
            "Register (Ctrl+R to switch to login)"
        } else {
            "Login (Ctrl+R to switch to register)"
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block, area);

        let waiting = matches!(router.session.state(), SessionState::Authenticating);
        let mut lines: Vec<Line> = Vec::new();
        if self.auth_form.registering {
            lines.push(field_line("Name", self.auth_form.name.value(), false));
        }
        lines.push(field_line("Email", self.auth_form.email.value(), false));
        lines.push(field_line("Password", self.auth_form.password.value(), true));
        if self.auth_form.registering {
            lines.push(field_line("Confirm", self.auth_form.confirm.value(), true));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            if waiting {
                "Authenticating..."
            } else {
                "Enter submit | Tab next field | Esc quit"
            },
            Style::default().fg(Color::Gray),
        )));

        let inner = area.inner(&Margin {
            horizontal: 2,
            vertical: 1,
        });
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    fn draw_chat<B: Backend>(&mut self, frame: &mut Frame<B>, router: &Router) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25), // Contacts panel
                Constraint::Percentage(75), // Chat panel
            ])
            .split(size);

        self.draw_sidebar(frame, router, chunks[0]);

        let chat_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Conversation header
                Constraint::Min(5),    // Messages area
                Constraint::Length(3), // Input box
                Constraint::Length(1), // Help line
            ])
            .split(chunks[1]);

        self.draw_messages(frame, router, chat_chunks[0], chat_chunks[1]);

        let input_block = Block::default()
            .title("Message")
            .borders(Borders::ALL)
            .border_style(match self.active_tab {
                Tab::Messages => Style::default().fg(Color::Yellow),
                _ => Style::default(),
            });
        frame.render_widget(Paragraph::new(self.input.value()).block(input_block), chat_chunks[2]);

        let help = Paragraph::new(Line::from(Span::styled(
            "ESC quit | TAB switch | Ctrl+F search | Ctrl+O attach | Ctrl+H help",
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(help, chat_chunks[3]);

        if let Tab::Messages = self.active_tab {
            frame.set_cursor(
                chat_chunks[2].x + self.input.cursor() as u16 + 1,
                chat_chunks[2].y + 1,
            );
        }

        if let Some(ConfirmAction::DeleteMessage(_)) = &self.confirm_dialog {
            draw_confirm(frame, "Delete this message? (y/n)", size);
        }
        if let Some(ConfirmAction::DeleteChat(_)) = &self.confirm_dialog {
            draw_confirm(
                frame,
                "Delete this chat? All messages will be removed. (y/n)",
                size,
            );
        }
        if let Some(input) = &self.attach_dialog {
            draw_attach_dialog(frame, input, size);
        }
        draw_call_popup(frame, router, size);
    }

    fn draw_sidebar<B: Backend>(&mut self, frame: &mut Frame<B>, router: &Router, area: Rect) {
        let mut items: Vec<ListItem> = Vec::new();
        // Maps flattened selection index -> list row index for highlight.
        let mut selectable_rows: Vec<usize> = Vec::new();

        match view::sidebar(&router.store) {
            SidebarView::SearchResults(rows) => {
                items.push(ListItem::new(Line::from(Span::styled(
                    "Search results",
                    Style::default().add_modifier(Modifier::BOLD),
                ))));
                if rows.is_empty() {
                    items.push(ListItem::new("  No users found"));
                }
                for row in &rows {
                    selectable_rows.push(items.len());
                    items.push(contact_item(row));
                }
            }
            SidebarView::Contacts(list) => {
                if list.pinned.is_empty() && list.normal.is_empty() && list.archived.is_empty() {
                    items.push(ListItem::new("No conversations yet"));
                    items.push(ListItem::new("Ctrl+F to search for users"));
                }
                for (title, rows) in [
                    ("Pinned", &list.pinned),
                    ("All Chats", &list.normal),
                    ("Archived", &list.archived),
                ] {
                    if rows.is_empty() {
                        continue;
                    }
                    items.push(ListItem::new(Line::from(Span::styled(
                        title,
                        Style::default().add_modifier(Modifier::BOLD),
                    ))));
                    for row in rows {
                        selectable_rows.push(items.len());
                        items.push(contact_item(row));
                    }
                }
            }
        }

        let title = if self.searching {
            format!("Search: {}", self.search.value())
        } else {
            "Contacts (Tab to focus)".to_string()
        };
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL).border_style(
                match self.active_tab {
                    Tab::Contacts => Style::default().fg(Color::Yellow),
                    _ => Style::default(),
                },
            ))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        state.select(selectable_rows.get(self.contact_index).copied());
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_messages<B: Backend>(
        &self,
        frame: &mut Frame<B>,
        router: &Router,
        header_area: Rect,
        area: Rect,
    ) {
        match view::message_pane(&router.store) {
            MessagePaneView::Welcome => {
                let header = Paragraph::new("Welcome");
                frame.render_widget(header, header_area);
                let welcome = Paragraph::new(
                    "Welcome to Palaver!\n\n\
                     Select a conversation from the sidebar or search for\n\
                     users (Ctrl+F) to start chatting.",
                )
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL));
                frame.render_widget(welcome, area);
            }
            MessagePaneView::Conversation {
                header,
                rows,
                filter,
            } => {
                let status = if header.online { "Online" } else { "Offline" };
                let mut header_text = format!("{} {} ({})", header.avatar, header.name, status);
                if let Some(filter) = filter {
                    header_text.push_str(&format!("  [showing {}]", filter.label()));
                }
                frame.render_widget(Paragraph::new(header_text), header_area);

                let width = area.width.saturating_sub(4).max(16) as usize;
                let items: Vec<ListItem> = if rows.is_empty() && filter.is_some() {
                    vec![ListItem::new("Nothing shared in this conversation")]
                } else {
                    rows.iter().map(|row| message_item(row, width)).collect()
                };

                let count = items.len();
                let list = List::new(items)
                    .block(Block::default().title("Messages").borders(Borders::ALL));
                let mut state = ListState::default();
                // Stick to the latest message.
                state.select(count.checked_sub(1));
                frame.render_stateful_widget(list, area, &mut state);
            }
        }
    }
}

fn field_line<'a>(label: &'a str, value: &'a str, mask: bool) -> Line<'a> {
    let shown = if mask {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::styled(format!("{:>9}: ", label), Style::default().fg(Color::Gray)),
        Span::raw(shown),
    ])
}

fn contact_item(row: &ContactRow) -> ListItem<'static> {
    let status = if row.online { "●" } else { "○" };
    let pin = if row.pinned { "📌" } else { "" };
    let mute = if row.muted { "🔕" } else { "" };
    let marker = if row.active { ">" } else { " " };
    let line = format!(
        "{} {} {}{}{}: {}",
        marker, status, row.name, pin, mute, row.preview
    );
    ListItem::new(line)
}

fn message_item(row: &view::MessageRow, width: usize) -> ListItem<'static> {
    let direction = if row.outgoing { "me" } else { "them" };
    let body = match &row.body {
        MessageBody::Text(text) => text.clone(),
        MessageBody::Image { caption, .. } => format!("[image] {}", caption),
        MessageBody::Video { caption, .. } => format!("[video] {}", caption),
        MessageBody::File { name, size } => format!("[file] {} ({})", name, size),
    };
    let status = match row.status {
        DeliveryStatus::Pending => " ⏳",
        DeliveryStatus::Failed => " ❌",
        DeliveryStatus::Delivered => "",
    };
    let text = format!("[{}] {}: {}{}", row.time, direction, body, status);
    let wrapped = textwrap::wrap(&text, width)
        .into_iter()
        .map(|line| Line::from(line.into_owned()))
        .collect::<Vec<_>>();
    let style = if row.outgoing {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    ListItem::new(wrapped).style(style)
}

fn draw_call_popup<B: Backend>(frame: &mut Frame<B>, router: &Router, size: Rect) {
    let text = match router.calls.state() {
        CallState::Idle => return,
        CallState::Outgoing { peer_id, kind } => {
            format!("Calling {} ({})...\n\nCtrl+K to cancel", peer_id, kind.label())
        }
        CallState::Incoming { peer_id, kind, .. } => {
            format!(
                "Incoming {} call from {}\n\ny answer | n reject",
                kind.label(),
                peer_id
            )
        }
        CallState::Active {
            peer_id,
            connected_at,
            ..
        } => {
            let secs = (Utc::now() - *connected_at).num_seconds().max(0);
            format!(
                "In call with {} ({:02}:{:02})\n\nCtrl+K to hang up",
                peer_id,
                secs / 60,
                secs % 60
            )
        }
    };
    let area = centered_rect(40, 25, size);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Call").borders(Borders::ALL)),
        area,
    );
}

fn draw_confirm<B: Backend>(frame: &mut Frame<B>, prompt: &str, size: Rect) {
    let area = centered_rect(50, 20, size);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(prompt)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Confirm").borders(Borders::ALL)),
        area,
    );
}

fn draw_attach_dialog<B: Backend>(frame: &mut Frame<B>, input: &Input, size: Rect) {
    let area = centered_rect(60, 20, size);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(input.value()).block(
            Block::default()
                .title("Attach file (enter path, Esc to cancel)")
                .borders(Borders::ALL),
        ),
        area,
    );
}

fn draw_notice<B: Backend>(frame: &mut Frame<B>, notice: &Notice, size: Rect) {
    let style = match notice.severity {
        Severity::Info => Style::default().fg(Color::Blue),
        Severity::Success => Style::default().fg(Color::Green),
        Severity::Error => Style::default().fg(Color::Red),
    };
    let width = size.width.min(44);
    let area = Rect {
        x: size.width.saturating_sub(width),
        y: 0,
        width,
        height: 4.min(size.height),
    };
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(notice.message.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(notice.title.clone())
                    .borders(Borders::ALL)
                    .border_style(style),
            ),
        area,
    );
}

fn draw_help<B: Backend>(frame: &mut Frame<B>, size: Rect) {
    let area = centered_rect(60, 60, size);
    frame.render_widget(Clear, area);
    let text = "Key bindings\n\n\
        Tab        switch contacts/messages focus\n\
        Enter      send message / open contact\n\
        Ctrl+F     search users\n\
        Ctrl+O     attach a file by path\n\
        Ctrl+G     cycle media filter (photos/videos/files)\n\
        Ctrl+P     pin/unpin selected chat\n\
        Ctrl+E     archive/unarchive selected chat\n\
        Ctrl+U     mute/unmute selected chat\n\
        Ctrl+D     delete message (messages) / chat (contacts)\n\
        Ctrl+V     video call, Ctrl+B audio call, Ctrl+K hang up\n\
        Ctrl+N     toggle notifications\n\
        Ctrl+R     refresh contact list\n\
        Ctrl+T     toggle dark mode\n\
        Ctrl+L     log out\n\
        Esc        quit\n\n\
        Press any key to close";
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Help").borders(Borders::ALL)),
        area,
    );
}

/// Helper to create a centered rect using a percentage of the available area
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver::client::{CallKind, CallManager, InboundEvent, OutboundEvent, Session};
    use palaver::models::{Contact, Message, User};
    use palaver::storage::MemoryKv;
    use palaver::{ChatStore, Notifier};

    fn wired_ui() -> (
        ChatUi,
        Router,
        mpsc::UnboundedReceiver<OutboundEvent>,
    ) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (notifier, notice_rx) = Notifier::new();
        let store = ChatStore::new(
            outbound_tx.clone(),
            notifier.clone(),
            Box::new(MemoryKv::new()),
        );
        let session = Session::new(outbound_tx.clone(), notifier.clone());
        let calls = CallManager::new(outbound_tx, notifier.clone());
        let mut router = Router::new(store, session, calls, notifier);

        router.handle(InboundEvent::AuthSuccess {
            user: User {
                id: "me".to_string(),
                name: "Me".to_string(),
                email: "me@example.com".to_string(),
                avatar: "M".to_string(),
                token: None,
            },
        });
        router.store.set_contacts(vec![Contact {
            id: "alice".to_string(),
            name: "Alice".to_string(),
            avatar: "A".to_string(),
            online: true,
            last_message: None,
            last_time: None,
            muted: false,
        }]);
        assert!(router.store.switch_contact("alice"));

        (ChatUi::new(notice_rx, false), router, outbound_rx)
    }

    fn incoming_text(id: &str, text: &str) -> Message {
        let mut message = Message::outgoing_text("alice", "me", text);
        message.id = id.to_string();
        message.client_id = None;
        message.status = DeliveryStatus::Delivered;
        message
    }

    #[test]
    fn call_popup_reopens_the_notification_gate() {
        let (mut chat_ui, mut router, _outbound_rx) = wired_ui();

        // Open conversation on screen, nothing covering it: no notice.
        chat_ui.tick(&mut router);
        chat_ui.notices.clear();
        router.handle(InboundEvent::NewMessage {
            message: incoming_text("srv-10", "first"),
        });
        chat_ui.tick(&mut router);
        assert!(chat_ui.notices.is_empty());

        // An incoming call popup now covers the pane.
        router.handle(InboundEvent::IncomingCall {
            caller_id: "bob".to_string(),
            call_type: CallKind::Audio,
        });
        chat_ui.tick(&mut router);
        router.handle(InboundEvent::NewMessage {
            message: incoming_text("srv-11", "second"),
        });
        chat_ui.tick(&mut router);
        assert!(chat_ui
            .notices
            .iter()
            .any(|(notice, _)| notice.message.contains("second")));
    }
}
