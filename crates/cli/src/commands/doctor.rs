use facebot_core::config::{AppConfig, LoadOptions};
use serde::Serialize;
use uuid::Uuid;

use super::{escape_json, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct ReadinessCheck {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl ReadinessCheck {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self { name, status, detail: detail.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<ReadinessCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let checks = run_checks();
    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);

    let report = DoctorReport {
        overall_status: if failed { CheckStatus::Fail } else { CheckStatus::Pass },
        summary: if failed {
            "doctor: readiness problems found".to_string()
        } else {
            "doctor: readiness checks passed".to_string()
        },
        checks,
    };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code: u8::from(failed), output }
}

fn run_checks() -> Vec<ReadinessCheck> {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let skipped = |name| {
                ReadinessCheck::new(
                    name,
                    CheckStatus::Skipped,
                    "not checked: configuration failed to load",
                )
            };
            return vec![
                ReadinessCheck::new("config_validation", CheckStatus::Fail, error.to_string()),
                skipped("bot_identity"),
                skipped("stamp_table"),
            ];
        }
    };

    vec![
        ReadinessCheck::new(
            "config_validation",
            CheckStatus::Pass,
            "configuration loads and validates",
        ),
        check_identity(&config),
        check_stamps(&config),
    ]
}

/// Mention triggering and admin commands need real ids; a nil id means that
/// surface silently never fires.
fn check_identity(config: &AppConfig) -> ReadinessCheck {
    let mut missing = Vec::new();
    if config.bot.user_id == Uuid::nil() {
        missing.push("bot.user_id");
    }
    if config.bot.admin_user_id == Uuid::nil() {
        missing.push("bot.admin_user_id");
    }

    if missing.is_empty() {
        ReadinessCheck::new("bot_identity", CheckStatus::Pass, "bot and admin identities set")
    } else {
        ReadinessCheck::new(
            "bot_identity",
            CheckStatus::Warn,
            format!(
                "{} unset; mention triggering and admin commands will not work",
                missing.join(", ")
            ),
        )
    }
}

fn check_stamps(config: &AppConfig) -> ReadinessCheck {
    let stamps = &config.bot.stamps;
    let unset = [
        stamps.ack,
        stamps.question,
        stamps.explosion,
        stamps.no_entry,
        stamps.wave,
        stamps.clap,
        stamps.cheer,
        stamps.face_positive,
        stamps.face_negative,
    ]
    .iter()
    .filter(|stamp| stamp.is_nil())
    .count();

    if unset == 0 {
        ReadinessCheck::new("stamp_table", CheckStatus::Pass, "all reaction stamps configured")
    } else {
        ReadinessCheck::new(
            "stamp_table",
            CheckStatus::Warn,
            format!("{unset} stamp id(s) unset; those stamp posts are skipped"),
        )
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut out = report.summary.clone();
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        out.push_str(&format!("\n- [{marker}] {}: {}", check.name, check.detail));
    }
    out
}
