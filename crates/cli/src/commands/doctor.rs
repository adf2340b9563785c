use boa_client::HttpRequestSource;
use boa_core::config::{AppConfig, LoadOptions};
use boa_core::RequestSource;
use boa_db::{connect_from_config, migrations};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => {
                    checks.push(runtime.block_on(check_backend_reachability(&config)));
                    checks.push(runtime.block_on(check_settings_database(&config)));
                }
                Err(error) => {
                    for name in ["backend_reachability", "settings_database"] {
                        checks.push(DoctorCheck {
                            name,
                            status: CheckStatus::Fail,
                            details: format!("failed to initialize async runtime: {error}"),
                        });
                    }
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["backend_reachability", "settings_database"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    summarize(checks)
}

fn summarize(checks: Vec<DoctorCheck>) -> DoctorReport {
    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

async fn check_backend_reachability(config: &AppConfig) -> DoctorCheck {
    let name = "backend_reachability";
    let source = match HttpRequestSource::from_config(&config.backend) {
        Ok(source) => source,
        Err(error) => return DoctorCheck { name, status: CheckStatus::Fail, details: error.to_string() },
    };

    match source.probe().await {
        Ok(()) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("reached `{}`", config.backend.base_url),
        },
        Err(error) => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("could not reach `{}`: {error}", config.backend.base_url),
        },
    }
}

async fn check_settings_database(config: &AppConfig) -> DoctorCheck {
    let name = "settings_database";
    let result = async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
        let applied = migrations::applied_count(&pool)
            .await
            .map_err(|error| format!("failed to read migration state: {error}"))?;
        pool.close().await;
        Ok::<i64, String>(applied)
    }
    .await;

    let expected = migrations::known_count();
    match result {
        Ok(applied) if applied >= expected => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Ok(applied) => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("{applied} of {expected} migrations applied; run `boa migrate`"),
        },
        Err(details) => DoctorCheck { name, status: CheckStatus::Fail, details },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{render_human, summarize, CheckStatus, DoctorCheck};

    #[test]
    fn one_failed_check_fails_the_report() {
        let report = summarize(vec![
            DoctorCheck { name: "config_validation", status: CheckStatus::Pass, details: "ok".into() },
            DoctorCheck { name: "backend_reachability", status: CheckStatus::Fail, details: "down".into() },
        ]);

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert_eq!(
            render_human(&report),
            "doctor: one or more readiness checks failed\n- [ok] config_validation: ok\n- [fail] backend_reachability: down"
        );
    }
}
