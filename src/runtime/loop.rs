use super::frontend::FrontendAdapter;
use crate::api::ChatTransport;
use crate::app::App;
use std::time::Duration;

const IDLE_TICK: Duration = Duration::from_millis(16);

/// Cooperative UI loop: apply reply updates, draw, then either handle one input
/// event or sleep a tick so reply tasks on the same thread make progress.
pub async fn run<T, F>(app: &mut App<T>, frontend: &mut F)
where
    T: ChatTransport + 'static,
    F: FrontendAdapter<T>,
{
    loop {
        app.drain_updates();
        if app.conversation_mut().take_follow_latest() {
            frontend.follow_latest();
        }
        frontend.render(app);
        if frontend.should_quit() || app.quit_requested() {
            break;
        }

        match frontend.poll_user_input(app) {
            Some(event) => {
                app.handle_input(event);
                tokio::task::yield_now().await;
            }
            None => tokio::time::sleep(IDLE_TICK).await,
        }
    }
}
