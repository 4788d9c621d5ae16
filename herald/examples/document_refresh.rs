//! Wires a source pane and a status bar to one bus, then replays a few server
//! events through the standard decoder.
//!
//! ```bash
//! cargo run -p herald --example document_refresh
//! ```

use std::sync::{Arc, Mutex};

use herald::{
    Bus, BusConfig, DispatchPolicy, Handler, HandlerError, HandlerResult, Registrar, Subscriber,
    events::{DocumentCloseRequested, DocumentRefreshed},
    logging::ChannelLogger,
    wire::Decoder,
};
use log::LevelFilter;

/// Keeps open documents by path.
#[derive(Default)]
struct SourcePane {
    open: Mutex<Vec<(String, String)>>,
}

impl Handler<DocumentRefreshed> for SourcePane {
    fn handle(&self, event: &DocumentRefreshed) -> HandlerResult {
        let mut open = self.open.lock().map_err(|_| HandlerError::msg("pane poisoned"))?;
        match open.iter_mut().find(|(path, _)| path == event.file_path()) {
            Some((_, content)) => *content = event.content().to_string(),
            None => open.push((event.file_path().to_string(), event.content().to_string())),
        }
        Ok(())
    }
}

impl Handler<DocumentCloseRequested> for SourcePane {
    fn handle(&self, event: &DocumentCloseRequested) -> HandlerResult {
        let mut open = self.open.lock().map_err(|_| HandlerError::msg("pane poisoned"))?;
        let before = open.len();
        open.retain(|(path, _)| path != event.file_path());
        if open.len() == before {
            return Err(HandlerError::msg(format!("{} is not open", event.file_path())));
        }
        Ok(())
    }
}

impl Subscriber for SourcePane {
    fn subscribe(self: Arc<Self>, registrar: &mut Registrar<'_>) {
        registrar
            .on::<DocumentRefreshed, _>(self.clone())
            .on::<DocumentCloseRequested, _>(self);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (logger, log_recv) = ChannelLogger::with_receiver();
    logger.with_max_level(LevelFilter::Debug).install()?;

    let bus = Bus::with_config(BusConfig {
        name: "workbench".into(),
        policy: DispatchPolicy::Isolate,
    });

    let pane = Arc::new(SourcePane::default());
    bus.subscribe(Arc::clone(&pane));
    bus.on::<DocumentRefreshed>(|event| {
        println!(
            "status: {} refreshed ({} bytes, clean: {})",
            event.file_path(),
            event.content().len(),
            event.mark_clean()
        );
        Ok(())
    });

    let decoder = Decoder::standard();
    let pushed = [
        r#"{"type":"refresh_document_content","data":{"document_id":"1","file_path":"~/a.R","content":"x <- 1"}}"#,
        r#"{"type":"refresh_document_content","data":{"document_id":"2","file_path":"~/b.R","content":"y <- 2","mark_clean":false}}"#,
        r#"{"type":"request_document_close_for_revert","data":{"file_path":"~/a.R"}}"#,
        r#"{"type":"request_document_close_for_revert","data":{"file_path":"~/missing.R"}}"#,
    ];
    for raw in pushed {
        if let Err(error) = decoder.dispatch(&bus, raw) {
            println!("error: {error}");
        }
    }

    println!("open documents: {:?}", pane.open.lock().map_err(|_| "pane poisoned")?);
    for message in log_recv.try_iter() {
        println!("{:>5} {}", message.level, message.message);
    }
    Ok(())
}
