use std::{cell::RefCell, path::PathBuf, rc::Rc};

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use speed_controller::{
    config::Config,
    dispatcher::ActionDispatcher,
    dom::{Document, NodeId},
    keys::KeyChord,
    registry::MediaRegistry,
    router::{InputRouter, KeyEvent},
};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "The path to the config file. The default is `vsc.toml`."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        help = "Key chords to press, in order, e.g. `D`, `shift+68` or `ctrl+M`. They are sent to a demo page with a video nested two shadow roots deep."
    )]
    pub keys: Vec<String>,
}

struct DemoPage {
    doc: Document,
    registry: MediaRegistry,
    router: InputRouter,
    video: NodeId,
}

impl DemoPage {
    fn new(config: Config) -> anyhow::Result<Self> {
        let settings = Rc::new(RefCell::new(config.settings));
        let mut doc = Document::new();
        let mut registry = MediaRegistry::new();
        let mut router = InputRouter::new(
            Rc::clone(&settings),
            ActionDispatcher::new(Rc::clone(&settings)),
        );

        let host = doc.create_element("div");
        let outer_root = doc.attach_shadow(host)?;
        let player = doc.create_element("div");
        doc.append_child(outer_root, player)?;
        let inner_root = doc.attach_shadow(player)?;
        let video = doc.create_element("video");
        doc.append_child(inner_root, video)?;
        doc.append_child(doc.body(), host)?;
        if let Some(media) = doc.media_mut(video) {
            media.duration = 600.0;
            media.paused = false;
        }

        registry.add_media_element(&mut doc, &settings.borrow(), video);
        for root in [doc.root(), outer_root, inner_root] {
            router.listen_on(&doc, root);
        }

        Ok(Self {
            doc,
            registry,
            router,
            video,
        })
    }

    fn press(&mut self, chord: KeyChord) {
        let mut event = KeyEvent::new(chord, self.doc.body());
        self.router
            .deliver_keydown(&mut self.doc, &mut self.registry, &mut event);
        if !event.is_default_prevented() {
            log::info!("{chord}: not handled");
        }
    }

    fn log_state(&self) {
        let Some(media) = self.doc.media(self.video) else {
            return;
        };
        let record = self.registry.get(self.video);
        log::info!(
            "rate={:.2} volume={:.2} muted={} paused={} time={:.1}s mark={:?} visibility={:?}",
            media.playback_rate,
            media.volume,
            media.muted,
            media.paused,
            media.current_time,
            record.and_then(|r| r.mark),
            record.map(|r| r.visibility),
        );
    }
}

pub fn start() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_env("VSC_LOG")
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let chords = cli
        .keys
        .iter()
        .map(|key| {
            key.parse::<KeyChord>()
                .with_context(|| format!("Invalid key chord '{key}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut page = DemoPage::new(config).context("Failed to build demo page")?;
    page.log_state();
    for chord in chords {
        page.press(chord);
        page.log_state();
    }

    Ok(())
}
