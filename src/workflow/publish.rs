use std::path::{Path, PathBuf};

use clap::Args;

use crate::error::{AppError, Result};
use crate::play::auth::{mint_access_token, ServiceAccount};
use crate::play::report::{self, Announcement};
use crate::play::rollout::{self, PublishResult, RolloutPlan};
use crate::play::PlayClient;

#[derive(Debug, Clone, Args)]
pub struct PublishArgs {
    /// Google service account key file
    #[arg(long)]
    pub service_account_json: PathBuf,
    #[arg(long)]
    pub package_name: String,
    /// Play track to release on, e.g. `production`
    #[arg(long)]
    pub track: String,
    /// Android App Bundle to upload
    #[arg(long)]
    pub aab: PathBuf,
    /// Native debug symbols archive
    #[arg(long)]
    pub native_symbols: Option<PathBuf>,
    #[arg(long)]
    pub release_name: String,
    /// Release notes shown on the store; `whatsnew-<locale>` names set the locale
    #[arg(long)]
    pub notes_file: PathBuf,
    /// Release notes for the announcement message
    #[arg(long)]
    pub raw_notes_file: PathBuf,
    #[arg(long)]
    pub app_name: String,
    #[arg(long)]
    pub github_release_url: String,
    #[arg(long)]
    pub play_console_production_url: String,
    /// Where to write the Telegram HTML announcement
    #[arg(long)]
    pub telegram_out: PathBuf,
    #[arg(long, default_value = "play_outputs.json")]
    pub outputs_file: PathBuf,
    /// Country code the staged rollout is limited to
    #[arg(long)]
    pub country: String,
    /// Share of users receiving the release, between 0 and 1
    #[arg(long)]
    pub user_fraction: String,
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read {}: {e}", path.display())))
}

/// Validate arguments and read the release notes before any API call.
pub fn prepare_plan(args: &PublishArgs) -> Result<RolloutPlan> {
    let user_fraction = rollout::validate_user_fraction(&args.user_fraction)?;
    let notes_text = read_text(&args.notes_file)?.trim().to_string();

    Ok(RolloutPlan {
        track: args.track.clone(),
        release_name: args.release_name.clone(),
        aab: args.aab.clone(),
        native_symbols: args.native_symbols.clone(),
        notes_locale: rollout::infer_locale(&args.notes_file),
        notes_text,
        country: args.country.clone(),
        user_fraction,
    })
}

/// Write the outputs file and the announcement for a finished rollout.
pub fn write_reports(
    args: &PublishArgs,
    result: &PublishResult,
    step_outputs: Option<&Path>,
) -> Result<()> {
    report::write_outputs(&args.outputs_file, result)?;

    let raw_notes = read_text(&args.raw_notes_file)?;
    let announcement = Announcement {
        app_name: &args.app_name,
        package: &args.package_name,
        release_name: &args.release_name,
        user_fraction: &args.user_fraction,
        country: &args.country,
        play_console_url: &args.play_console_production_url,
        github_release_url: &args.github_release_url,
        raw_notes: &raw_notes,
    };
    std::fs::write(
        &args.telegram_out,
        report::telegram_message(&announcement, result),
    )?;

    let halted = result.halted_previous.to_string();
    super::emit_step_outputs(
        step_outputs,
        &[
            ("version_code", result.version_code.as_str()),
            ("halted_previous", halted.as_str()),
        ],
    )
}

pub async fn run(args: &PublishArgs) -> Result<PublishResult> {
    let plan = prepare_plan(args)?;
    let account = ServiceAccount::load(&args.service_account_json)?;

    let http = reqwest::Client::new();
    let token = mint_access_token(&http, &account).await?;
    let api = PlayClient::new(http, token, &args.package_name);

    tracing::info!(
        package = %args.package_name,
        track = %plan.track,
        release = %plan.release_name,
        "Publishing to Google Play"
    );

    let result = rollout::publish(&api, &plan).await?;
    write_reports(args, &result, super::step_output_path().as_deref())?;
    Ok(result)
}
