//! HTTP request handlers

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{error, info};

use crate::errors::SkyliftError;
use crate::ops::build::{build_env, BuildOptions};
use crate::ops::update::{update_env, UpdateOptions};
use crate::ops::DeploymentRun;
use crate::server::gate::{ServerStatus, StatusPermit};
use crate::server::state::ServerState;
use crate::source;
use crate::storage::settings::save_settings;
use crate::utils::version_info;

/// Status page handler
pub async fn panel_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let status = state.gate.current();
    let envs: Vec<String> = {
        let settings = state.settings.read().await;
        settings.deploy.keys().cloned().collect()
    };
    let footer = fortune().await;

    Html(render_panel(status, &envs, footer.as_deref()))
}

/// Form posted by the panel's submit buttons
#[derive(Debug, Deserialize)]
pub struct ActionForm {
    pub action: String,
    pub env: String,
}

/// Triggered operation handler.
///
/// Accepted work runs on its own task while the response returns
/// immediately; a busy gate answers 409 with the state in the way.
pub async fn action_handler(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<ActionForm>,
) -> Response {
    let action = match form.action.as_str() {
        "Build" => PanelAction::Build,
        "Update" => PanelAction::Update,
        other => {
            return (StatusCode::BAD_REQUEST, format!("unknown action {}", other))
                .into_response()
        }
    };

    {
        let settings = state.settings.read().await;
        if !settings.deploy.contains_key(&form.env) {
            return (
                StatusCode::BAD_REQUEST,
                format!("deploy {} not found", form.env),
            )
                .into_response();
        }
    }

    let permit = match state.gate.clone().try_begin(action.status()) {
        Ok(permit) => permit,
        Err(current) => {
            return (StatusCode::CONFLICT, format!("busy: {}", current)).into_response()
        }
    };

    info!("{} of {} accepted", form.action, form.env);
    tokio::spawn(run_action(state.clone(), permit, action, form.env));

    Redirect::to("/").into_response()
}

/// Everything else gets an empty answer
pub async fn no_content_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Clone, Copy)]
enum PanelAction {
    Build,
    Update,
}

impl PanelAction {
    fn status(self) -> ServerStatus {
        match self {
            PanelAction::Build => ServerStatus::Building,
            PanelAction::Update => ServerStatus::Updating,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            PanelAction::Build => "build",
            PanelAction::Update => "update",
        }
    }
}

async fn run_action(
    state: Arc<ServerState>,
    permit: StatusPermit,
    action: PanelAction,
    env: String,
) {
    if let Err(e) = drive(state.as_ref(), action, &env).await {
        error!("{} of {} failed: {}", action.verb(), env, e);
    }
    drop(permit);
}

async fn drive(state: &ServerState, action: PanelAction, env: &str) -> Result<(), SkyliftError> {
    let snapshot = {
        let settings = state.settings.read().await;
        settings.clone()
    };

    let source = source::prepare(&snapshot, state.dir.as_deref(), &state.tag).await?;
    let mut run = DeploymentRun::checkout(&snapshot, env, source)?;
    let mut shutdown_rx = state.shutdown_tx.subscribe();

    match action {
        PanelAction::Build => {
            build_env(
                state.cloud.as_ref(),
                state.runner.as_ref(),
                &mut run,
                &BuildOptions::default(),
                &mut shutdown_rx,
            )
            .await?;
            update_env(
                state.cloud.as_ref(),
                state.runner.as_ref(),
                state.transfer.as_ref(),
                &mut run,
                &UpdateOptions::default(),
            )
            .await?;
        }
        PanelAction::Update => {
            update_env(
                state.cloud.as_ref(),
                state.runner.as_ref(),
                state.transfer.as_ref(),
                &mut run,
                &UpdateOptions::default(),
            )
            .await?;
        }
    }

    let mut settings = state.settings.write().await;
    run.commit(&mut settings);
    save_settings(&state.conf_file, &settings).await?;

    Ok(())
}

fn render_panel(status: ServerStatus, envs: &[String], footer: Option<&str>) -> String {
    let version = version_info();

    let mut page = String::new();
    page.push_str("<html><head>");
    page.push_str(&format!("<title>Build Server {}</title>", version.version));
    page.push_str("<style>\n");
    page.push_str(".waiting { color: #0f0 }\n");
    page.push_str(".building { color: #f00 }\n");
    page.push_str(".updating { color: #00f }\n");
    page.push_str(".footer { margin-top: 2em; color: #999 }\n");
    page.push_str("</style></head><body>\n");
    page.push_str("<h1>Build Server</h1>\n");
    page.push_str(&format!(
        "<p>Status: <span class=\"{status}\">{status}</span></p>\n"
    ));

    if status == ServerStatus::Waiting {
        page.push_str("<form method=\"post\" action=\"/\">\n");
        page.push_str("<select name=\"env\">\n");
        for env in envs {
            page.push_str(&format!("<option value=\"{env}\">{env}</option>\n"));
        }
        page.push_str("</select>\n");
        page.push_str("<input type=\"submit\" name=\"action\" value=\"Build\">\n");
        page.push_str("<input type=\"submit\" name=\"action\" value=\"Update\">\n");
        page.push_str("</form>\n");
    }

    if let Some(footer) = footer {
        page.push_str(&format!(
            "<div class=\"footer\"><pre>{}</pre></div>\n",
            footer
        ));
    }

    page.push_str("</body></html>\n");
    page
}

async fn fortune() -> Option<String> {
    match Command::new("fortune").output().await {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_offers_actions_only_when_waiting() {
        let envs = vec!["default".to_string(), "staging".to_string()];

        let waiting = render_panel(ServerStatus::Waiting, &envs, None);
        assert!(waiting.contains("value=\"Build\""));
        assert!(waiting.contains("value=\"Update\""));
        assert!(waiting.contains("<option value=\"staging\">"));

        let building = render_panel(ServerStatus::Building, &envs, None);
        assert!(!building.contains("value=\"Build\""));
        assert!(building.contains("class=\"building\""));
    }

    #[test]
    fn test_panel_footer_shown_when_present() {
        let page = render_panel(ServerStatus::Waiting, &[], Some("so it goes"));
        assert!(page.contains("so it goes"));
        assert!(page.contains("class=\"footer\""));
    }
}
