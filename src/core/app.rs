//! Operator console application
//!
//! Owns the session and the analysis controller, dispatches parsed commands
//! and applies count updates from the poll, all on one thread.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::annotations::handlers::handle_draw_msg;
use crate::capture::load_reference_frame;
use crate::config::AppConfig;
use crate::domain::ClassId;
use crate::engine::{Engine, EngineClient};
use crate::render::image::{OverlayStyle, render_overlay, save_overlay};
use crate::report::dashboard::render_dashboard;
use crate::report::export::{ExportFormat, export_report};
use crate::session::commands::{self, HELP};
use crate::session::controller::{AnalysisController, CountsUpdate};
use crate::session::messages::{Feedback, Msg, SessionMsg};
use crate::session::state::{Phase, Session};

pub struct App<E: Engine> {
    config: AppConfig,
    style: OverlayStyle,
    session: Session,
    controller: AnalysisController<E>,
}

impl<E: Engine> App<E> {
    pub fn new(config: AppConfig, engine: E) -> (Self, UnboundedReceiver<CountsUpdate>) {
        let (controller, updates) = AnalysisController::new(engine, config.poll_interval());
        let app = Self {
            style: OverlayStyle::from(&config),
            session: Session::new(config.fit_mode),
            config,
            controller,
        };
        (app, updates)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn update(&mut self, msg: Msg) -> Vec<Feedback> {
        match msg {
            Msg::Draw(msg) => handle_draw_msg(&mut self.session, msg),
            Msg::Session(msg) => self.handle_session_msg(msg).await,
            Msg::Help => vec![Feedback::info(HELP)],
            Msg::Quit => Vec::new(),
        }
    }

    /// Apply a poll response
    pub fn on_counts(&mut self, update: CountsUpdate) {
        let seq = update.seq;
        if self.controller.apply(&mut self.session, update) {
            log::debug!("Applied counts #{}", seq);
        }
    }

    /// Stop any running analysis before exit
    pub fn shutdown(&mut self) {
        if self.session.is_running() {
            let _ = self.controller.stop(&mut self.session);
        }
    }

    async fn handle_session_msg(&mut self, msg: SessionMsg) -> Vec<Feedback> {
        match msg {
            SessionMsg::Load(path) => self.load(path).await,
            SessionMsg::Render(path) => self.render(&path),
            SessionMsg::Start => match self.controller.start(&mut self.session).await {
                Ok(()) => vec![
                    Feedback::info("Análisis iniciado"),
                    Feedback::info(format!("Transmisión en vivo: {}", self.feed_url())),
                ],
                Err(err) => vec![Feedback::error(err.to_string())],
            },
            SessionMsg::Stop => match self.controller.stop(&mut self.session) {
                Ok(()) => vec![Feedback::info("Análisis detenido")],
                Err(err) => vec![Feedback::warning(err.to_string())],
            },
            SessionMsg::Status => self.status(),
            SessionMsg::Export(format, path) => self.export(format, path),
            SessionMsg::ListClasses => ClassId::ALL
                .iter()
                .map(|&class| {
                    let mark = if self.session.selected.contains(class) { "x" } else { " " };
                    Feedback::info(format!("[{}] {}", mark, class))
                })
                .collect(),
        }
    }

    fn feed_url(&self) -> &str {
        match &self.session.phase {
            Phase::Running { feed_url } => feed_url,
            Phase::Configuring => "",
        }
    }

    async fn load(&mut self, path: PathBuf) -> Vec<Feedback> {
        if self.session.is_running() {
            return vec![Feedback::warning(
                "Detenga el análisis antes de cargar otro video",
            )];
        }

        let loaded = tokio::task::spawn_blocking(move || load_reference_frame(&path))
            .await
            .context("Frame loader panicked")
            .and_then(|r| r);
        match loaded {
            Ok(frame) => {
                let dims = frame.dims();
                self.session.set_media(frame);
                vec![Feedback::info(format!(
                    "Video cargado: {}x{}",
                    dims.width, dims.height
                ))]
            }
            Err(err) => {
                log::error!("Failed to load media: {:#}", err);
                vec![Feedback::error(format!("{:#}", err))]
            }
        }
    }

    fn render(&self, path: &Path) -> Vec<Feedback> {
        if self.session.is_running() {
            return vec![Feedback::info(format!(
                "Análisis en curso; vista en vivo: {}",
                self.feed_url()
            ))];
        }

        let result = render_overlay(&self.session.scene(), &self.style)
            .and_then(|img| save_overlay(&img, path));
        match result {
            Ok(()) => vec![Feedback::info(format!("Overlay guardado en {}", path.display()))],
            Err(err) => {
                log::error!("Failed to render overlay: {:#}", err);
                vec![Feedback::error(format!("{:#}", err))]
            }
        }
    }

    fn status(&self) -> Vec<Feedback> {
        let session = &self.session;
        let dims = session.dims();
        let media = match &session.media {
            Some(frame) => format!("{} ({}x{})", frame.path.display(), dims.width, dims.height),
            None => "sin video".to_string(),
        };
        let phase = if session.is_running() { "en curso" } else { "configuración" };
        let polling = if self.controller.is_polling() { "activa" } else { "detenida" };
        let classes: Vec<&str> = session.selected.as_slice().iter().map(|c| c.as_str()).collect();

        let mut out = vec![
            Feedback::info(format!("Estado: {} | Consulta de conteos: {}", phase, polling)),
            Feedback::info(format!("Video: {}", media)),
            Feedback::info(format!(
                "Herramienta: {} | Clases: {}",
                session.drawing.tool().label(),
                classes.join(", ")
            )),
        ];
        if !session.drawing.buffer().is_empty() {
            out.push(Feedback::info(format!(
                "Forma en curso: {}/{} puntos",
                session.drawing.buffer().len(),
                session.drawing.tool().required_points()
            )));
        }
        out.push(Feedback::info(render_dashboard(
            &session.report(),
            session.counts.updated_at(),
        )));
        out
    }

    /// Explicit path, or the default file name inside the export directory
    fn export_path(&self, format: ExportFormat, path: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = path {
            return Ok(path);
        }
        let dir = self.config.export_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(format.default_path(&dir))
    }

    fn export(&self, format: ExportFormat, path: Option<PathBuf>) -> Vec<Feedback> {
        let result = self.export_path(format, path).and_then(|path| {
            export_report(&self.session.report(), format, &path)?;
            Ok(path)
        });

        match result {
            Ok(path) => vec![Feedback::info(format!("Reporte exportado: {}", path.display()))],
            Err(err) => {
                log::error!("Export failed: {:#}", err);
                vec![Feedback::error(format!("{:#}", err))]
            }
        }
    }
}

fn print_feedback(lines: &[Feedback]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Run the console until `quit` or end of input
pub async fn run(config: AppConfig) -> Result<()> {
    let engine = EngineClient::new(&config.engine_url, config.request_timeout())?;
    log::info!("Using engine at {}", config.engine_url);

    let (mut app, mut updates) = App::new(config, engine);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_feedback(&[Feedback::info(
        "zonecensus listo. Escriba 'help' para ver los comandos.",
    )]);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match commands::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(Msg::Quit)) => break,
                    Ok(Some(msg)) => print_feedback(&app.update(msg).await),
                    Err(err) => print_feedback(&[Feedback::error(format!("{:#}", err))]),
                }
            }
            Some(update) = updates.recv() => app.on_counts(update),
        }
    }

    app.shutdown();
    log::info!("Exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayPointer, LiveCounts, MediaDimensions, ToolKind, Zone};
    use crate::session::messages::DrawMsg;
    use image::RgbaImage;

    #[derive(Clone)]
    struct StubEngine;

    impl Engine for StubEngine {
        async fn upload_config(&self, _media: &Path, _zones: &[Zone]) -> Result<()> {
            Ok(())
        }

        async fn fetch_counts(&self) -> Result<LiveCounts> {
            let mut counts = LiveCounts::default();
            counts.set(0, ClassId::Auto, 7);
            Ok(counts)
        }

        fn feed_url(&self) -> String {
            "http://engine/video_feed?t=42".to_string()
        }
    }

    fn click(x: f32, y: f32) -> Msg {
        Msg::Draw(DrawMsg::Click(DisplayPointer::new(x, y, 640.0, 360.0)))
    }

    #[tokio::test]
    async fn test_full_hd_polygon_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("frame.png");
        RgbaImage::new(1920, 1080).save(&media).unwrap();

        let (mut app, _updates) = App::new(AppConfig::default(), StubEngine);
        app.update(Msg::Session(SessionMsg::Load(media))).await;
        assert_eq!(app.session().dims(), MediaDimensions::new(1920, 1080));

        app.update(Msg::Draw(DrawMsg::SelectTool(ToolKind::Polygon))).await;
        for (x, y) in [(0.0, 0.0), (640.0, 0.0), (640.0, 360.0), (0.0, 360.0)] {
            app.update(click(x, y)).await;
        }
        assert!(app.session().zones.is_empty());
        app.update(Msg::Draw(DrawMsg::Name(Some("Plaza".into())))).await;

        let zones = app.session().zones.as_slice();
        assert_eq!(zones.len(), 1);
        assert!(
            zones[0]
                .points
                .iter()
                .all(|p| (0.0..=1920.0).contains(&p.x) && (0.0..=1080.0).contains(&p.y))
        );
        assert_eq!(zones[0].points[2].x, 1920.0);
        assert_eq!(zones[0].points[2].y, 1080.0);
    }

    #[tokio::test]
    async fn test_start_switches_to_live_view() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("frame.png");
        RgbaImage::new(64, 36).save(&media).unwrap();

        let (mut app, _updates) = App::new(AppConfig::default(), StubEngine);

        let feedback = app.update(Msg::Session(SessionMsg::Start)).await;
        assert!(matches!(&feedback[0], Feedback::Error(msg) if msg.starts_with("Por favor")));

        app.update(Msg::Session(SessionMsg::Load(media))).await;
        app.update(click(0.0, 0.0)).await;
        app.update(click(320.0, 180.0)).await;
        app.update(Msg::Draw(DrawMsg::Name(None))).await;
        app.update(Msg::Session(SessionMsg::Start)).await;
        assert!(app.session().is_running());
        let status = app.update(Msg::Session(SessionMsg::Status)).await;
        assert_eq!(
            status[0],
            Feedback::info("Estado: en curso | Consulta de conteos: activa")
        );

        let out = dir.path().join("overlay.png");
        let feedback = app.update(Msg::Session(SessionMsg::Render(out.clone()))).await;
        assert!(!out.exists());
        assert!(matches!(&feedback[0], Feedback::Info(msg) if msg.contains("video_feed?t=42")));

        app.on_counts(CountsUpdate {
            seq: 0,
            counts: {
                let mut counts = LiveCounts::default();
                counts.set(0, ClassId::Auto, 7);
                counts
            },
        });
        let csv = dir.path().join("report.csv");
        app.update(Msg::Session(SessionMsg::Export(ExportFormat::Csv, Some(csv.clone()))))
            .await;
        let text = std::fs::read_to_string(&csv).unwrap();
        assert!(text.starts_with("Carril,Tipo,Auto,Moto,Colectivo,Bicicleta\n"));
        assert!(text.contains("Carril 1,Cruce,7,0,0,0"));

        app.update(Msg::Session(SessionMsg::Stop)).await;
        assert!(!app.session().is_running());
        let status = app.update(Msg::Session(SessionMsg::Status)).await;
        assert_eq!(
            status[0],
            Feedback::info("Estado: configuración | Consulta de conteos: detenida")
        );
        app.update(Msg::Session(SessionMsg::Render(out.clone()))).await;
        assert_eq!(image::open(&out).unwrap().width(), 64);
    }
}
