#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct MutationSummary {
    applied: usize,
    skipped: usize,
    failed: usize,
    notices: usize,
}

fn summarize(report: &MutationReport) -> MutationSummary {
    let mut summary = MutationSummary {
        notices: report.notices.len(),
        ..MutationSummary::default()
    };
    for outcome in &report.renames {
        match outcome.status {
            RenameStatus::Applied { .. } => summary.applied += 1,
            RenameStatus::Skipped => summary.skipped += 1,
            RenameStatus::Failed { .. } => summary.failed += 1,
        }
    }
    summary
}

fn log_mutation(joined: MutationTask) {
    match joined {
        Ok(Ok(report)) => {
            let summary = summarize(&report);
            if summary == MutationSummary::default() {
                return;
            }
            if summary.failed > 0 {
                tracing::warn!(
                    applied = summary.applied,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    notices = summary.notices,
                    "mutation finished with abandoned renames"
                );
            } else {
                tracing::info!(
                    applied = summary.applied,
                    skipped = summary.skipped,
                    notices = summary.notices,
                    "mutation finished"
                );
            }
        }
        Ok(Err(err)) => tracing::warn!(error = %err, "mutation failed"),
        Err(err) => tracing::error!(error = %err, "mutation task panicked"),
    }
}

fn settings_from_env() -> Settings {
    Settings {
        diverge_from_standard: read_bool_env("JDEX_DIVERGE", false),
        flattened_structure: read_bool_env("JDEX_FLATTENED", false),
        folders_in_first_ten: read_bool_env("JDEX_FOLDERS_IN_FIRST_TEN", false),
        fill_item_gaps: read_bool_env("JDEX_FILL_ITEM_GAPS", false),
    }
}

fn expand_with_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(value)
}

fn read_u64_env(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn read_bool_env(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|value| parse_bool(&value))
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
