use crate::api::RouteSource;
use crate::cmd::Context;
use crate::ui::calendar_view::{App, run_app};
use crate::ui::{restore_terminal, setup_terminal};
use anyhow::Result;
use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::info;

pub fn run(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let client = ctx.client()?;
    info!(api = client.base_url(), "starting calendar");
    let source: Arc<dyn RouteSource> = Arc::new(client);
    let account = session.user.as_ref().map(|u| match &u.name {
        Some(name) => format!("{name} <{}>", u.email),
        None => u.email.clone(),
    });

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;
    let mut app = App::new(
        source,
        Local,
        Utc::now,
        ctx.settings().api_base().to_string(),
        account,
    );

    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal)?;
    result
}
