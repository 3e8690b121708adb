/// Interactive TUI: one page controller per configured resource, shown as tabs

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::core::{CollectionApi, Completion, HttpApiClient, Job, PageController, Resource};
use crate::screens::ResourceScreen;
use crate::utils::AppConfig;

pub struct App<A: CollectionApi + ?Sized + 'static> {
    pages: Vec<PageController<A>>,
    current: usize,
    base_url: String,
    show_help: bool,
    should_quit: bool,

    // Finished jobs from background tasks, tagged with the page index
    completion_tx: UnboundedSender<(usize, Completion)>,
    completion_rx: UnboundedReceiver<(usize, Completion)>,
}

impl App<HttpApiClient> {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = HttpApiClient::new(config.to_client_settings()?)?;
        let resources = config.resources()?;
        Ok(Self::new(Arc::new(client), resources, config.api.base_url.clone()))
    }
}

impl<A: CollectionApi + ?Sized + 'static> App<A> {
    pub fn new(api: Arc<A>, resources: Vec<Resource>, base_url: String) -> Self {
        let (completion_tx, completion_rx) = unbounded_channel();
        let pages = resources
            .into_iter()
            .map(|resource| PageController::new(Arc::clone(&api), resource))
            .collect();

        Self {
            pages,
            current: 0,
            base_url,
            show_help: false,
            should_quit: false,
            completion_tx,
            completion_rx,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> Option<&PageController<A>> {
        self.pages.get(self.current)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")?;

        self.ensure_loaded(self.current);
        info!(resources = self.pages.len(), base_url = %self.base_url, "tui started");

        let result = self.run_loop(&mut terminal);

        // Restore terminal, even if the loop failed
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.drain_completions();

            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key_event) = event::read()? {
                    self.handle_key(key_event);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Apply every completion delivered so far (non-blocking)
    pub fn drain_completions(&mut self) {
        while let Ok((index, completion)) = self.completion_rx.try_recv() {
            self.apply_completion(index, completion);
        }
    }

    fn apply_completion(&mut self, index: usize, completion: Completion) {
        if let Some(page) = self.pages.get_mut(index) {
            if let Some(follow_up) = page.apply(completion) {
                self.dispatch(index, follow_up);
            }
        }
    }

    fn dispatch(&self, index: usize, job: Job) {
        let tx = self.completion_tx.clone();
        self.pages[index].dispatch(job, move |completion| {
            // Receiver only goes away on shutdown
            let _ = tx.send((index, completion));
        });
    }

    /// First visit to a tab loads its first page
    fn ensure_loaded(&mut self, index: usize) {
        let job = match self.pages.get_mut(index) {
            Some(page) if page.table().meta().is_none() && !page.table().is_loading() => page.load(1),
            _ => return,
        };
        self.dispatch(index, job);
    }

    fn switch_tab(&mut self, index: usize) {
        if index < self.pages.len() && index != self.current {
            debug!(from = self.current, to = index, "switching resource");
            self.current = index;
            self.ensure_loaded(index);
        }
    }

    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.kind != KeyEventKind::Press {
            return;
        }

        if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Dismiss help on any key
        if self.show_help {
            self.show_help = false;
            return;
        }

        let Some(page) = self.pages.get(self.current) else {
            self.should_quit = matches!(key_event.code, KeyCode::Char('q') | KeyCode::Esc);
            return;
        };

        if page.overlay().is_visible() {
            self.handle_form_key(key_event.code);
        } else if page.pending_delete().is_some() {
            self.handle_confirm_key(key_event.code);
        } else {
            self.handle_page_key(key_event.code);
        }
    }

    fn handle_page_key(&mut self, key: KeyCode) {
        let index = self.current;
        let page = &mut self.pages[index];
        page.clear_status();

        let job = match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.show_help = true;
                None
            }
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => page.next_page(),
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => page.prev_page(),
            KeyCode::Char('r') | KeyCode::F(5) => Some(page.refresh()),
            KeyCode::Down | KeyCode::Char('j') => {
                page.select_next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                page.select_prev();
                None
            }
            KeyCode::Char('a') => {
                page.open_form();
                None
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                page.request_delete();
                None
            }
            KeyCode::Tab | KeyCode::Char(']') => {
                self.switch_tab((index + 1) % self.pages.len());
                None
            }
            KeyCode::BackTab | KeyCode::Char('[') => {
                self.switch_tab((index + self.pages.len() - 1) % self.pages.len());
                None
            }
            KeyCode::Char(c @ '1'..='9') => {
                self.switch_tab(c as usize - '1' as usize);
                None
            }
            _ => None,
        };

        if let Some(job) = job {
            self.dispatch(index, job);
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        let index = self.current;
        let page = &mut self.pages[index];

        match key {
            KeyCode::Esc => {
                page.cancel_form();
            }
            KeyCode::Enter => {
                // Validation failures are shown next to the fields
                if let Ok(job) = page.submit_form() {
                    self.dispatch(index, job);
                }
            }
            KeyCode::Tab | KeyCode::Down => page.overlay_mut().focus_next(),
            KeyCode::BackTab | KeyCode::Up => page.overlay_mut().focus_prev(),
            KeyCode::Backspace => page.overlay_mut().backspace(),
            KeyCode::Char(c) => page.overlay_mut().insert_char(c),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyCode) {
        let index = self.current;
        let page = &mut self.pages[index];

        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(job) = page.confirm_delete() {
                    self.dispatch(index, job);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => page.dismiss_delete(),
            _ => {}
        }
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        let Some(page) = self.pages.get(self.current) else {
            return;
        };

        let screen = ResourceScreen {
            tabs: self
                .pages
                .iter()
                .enumerate()
                .map(|(i, p)| (p.resource().title.clone(), i == self.current))
                .collect(),
            base_url: &self.base_url,
            show_help: self.show_help,
        };
        screen.render(frame, page);
    }
}
