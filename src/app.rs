use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use eframe::egui;

use crate::config::ViewerConfig;
use crate::data::source::{DataSource, FetchError, LoadOutcome, spawn_fetch};
use crate::state::Session;
use crate::ui::{ViewState, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

/// A load running on a worker thread.
struct PendingLoad {
    request: u64,
    origin: String,
    rx: Receiver<LoadOutcome>,
}

pub struct VectorScopeApp {
    pub session: Session,
    pub view: ViewState,
    config: ViewerConfig,
    pending: Option<PendingLoad>,
}

impl VectorScopeApp {
    /// Create the app and kick off the initial fetch.
    pub fn new(config: ViewerConfig) -> Self {
        let mut app = Self {
            session: Session::new(),
            view: ViewState::default(),
            config,
            pending: None,
        };
        let source = app.config.initial_source();
        app.start_load(source);
        app
    }

    /// Issue a single fetch. A load already in flight is superseded.
    pub fn start_load(&mut self, source: Box<dyn DataSource>) {
        let origin = source.describe();
        let request = self.session.begin_load(origin.clone());
        self.pending = Some(PendingLoad {
            request,
            origin,
            rx: spawn_fetch(source, request),
        });
    }

    pub fn reload_from_api(&mut self) {
        let source = self.config.api_source();
        self.start_load(source);
    }

    fn poll_load(&mut self, ctx: &egui::Context) {
        let Some(pending) = &self.pending else {
            return;
        };
        match pending.rx.try_recv() {
            Ok(outcome) => {
                self.session.finish_load(outcome);
                self.pending = None;
            }
            Err(TryRecvError::Empty) => {
                ctx.request_repaint_after(Duration::from_millis(100));
            }
            Err(TryRecvError::Disconnected) => {
                log::error!("Loader for {} exited without a result", pending.origin);
                let outcome = LoadOutcome {
                    request: pending.request,
                    origin: pending.origin.clone(),
                    result: Err(FetchError::Interrupted),
                };
                self.session.finish_load(outcome);
                self.pending = None;
            }
        }
    }
}

impl eframe::App for VectorScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_load(ctx);

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.session.clear_selection();
        }

        // ---- Top panel: menu bar ----
        let mut action = None;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            action = panels::top_bar(ui, &self.session, &mut self.view);
        });
        match action {
            Some(panels::TopBarAction::Open(source)) => self.start_load(source),
            Some(panels::TopBarAction::ReloadApi) => self.reload_from_api(),
            None => {}
        }

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::filter_panel(ui, &mut self.session, &mut self.view);
            });

        // ---- Right side panel: inspector + stats ----
        egui::SidePanel::right("inspector_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::inspector_panel(ui, &self.session);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(pick) = plot::scatter_plot(ui, &self.session, self.view.projection) {
                if let Some(rec) = self.session.select_point(pick.generation, pick.index) {
                    log::debug!("Selected vector {}", rec.id);
                }
            }
        });
    }
}
