//! QuoteDesk Demo: Quote-to-Invoice Lifecycle
//!
//! Walks one alarm-installation estimate through the full workflow:
//!
//! 1. **Quote Request** — customer asks for a quote, portal invite goes out
//! 2. **Photo Review** — admin requires site photos; upload, review, changes, resubmit
//! 3. **Acceptance** — approval opens acceptance; customer accepts, invoice issued
//! 4. **Payments** — partial payment, then settlement in minor units
//! 5. **Journals** — the bounded event log and simulated API trace
//!
//! Also demonstrates that out-of-order commands are rejected without
//! touching the record.

use colored::Colorize;
use estimate_engine::{ServiceConfig, WorkflowService};
use estimate_types::{ActorKind, EstimateId};
use serde_json::{json, Value};

fn separator() {
    println!("{}", "━".repeat(72).dimmed());
}

fn header(title: &str) {
    println!();
    println!("{}", "═".repeat(72).cyan());
    println!("  {}", title.cyan().bold());
    println!("{}", "═".repeat(72).cyan());
}

fn show_state(service: &WorkflowService) {
    let status = service.display_status();
    let step = status
        .step()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "frozen".to_string());
    println!(
        "  {} status: {}  step: {}  version: {}",
        "└".dimmed(),
        status.label().green().bold(),
        step.yellow(),
        service.version().to_string().yellow()
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_target(false)
        .init();

    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════════╗".cyan());
    println!("{}", "║    QuoteDesk Demo: Quote-to-Invoice Lifecycle                ║".cyan().bold());
    println!("{}", "╚══════════════════════════════════════════════════════════════╝".cyan());

    let mut service = WorkflowService::new(ServiceConfig {
        estimate_id: EstimateId::parse("EST-DEMO-0001").unwrap(),
        ..ServiceConfig::default()
    });

    // ── Part 1: Quote Request ───────────────────────────────────────
    header("Part 1: Quote Request and Portal Invite");

    service
        .dispatch("request-quote", ActorKind::Customer, Value::Null)
        .unwrap();

    let record = service.record();
    println!(
        "  {} quote number:  {}",
        "├".dimmed(),
        record.quote.number.as_deref().unwrap().green()
    );
    println!(
        "  {} portal invite: {}",
        "├".dimmed(),
        record.account.portal_url.as_deref().unwrap().blue()
    );
    show_state(&service);

    // A second request bounces off the guard.
    let err = service
        .dispatch("request-quote", ActorKind::Customer, Value::Null)
        .unwrap_err();
    separator();
    println!(
        "  {} repeat request rejected: {}",
        "└".dimmed(),
        err.to_string().red()
    );

    // ── Part 2: Photo Review ────────────────────────────────────────
    header("Part 2: Site Photos and Admin Review");

    service
        .dispatch(
            "toggle-photos-required",
            ActorKind::Admin,
            json!({"required": true}),
        )
        .unwrap();
    println!("  {} admin requires site photos", "├".dimmed());
    show_state(&service);

    service
        .dispatch(
            "upload-photos",
            ActorKind::Customer,
            json!({"label": "Panel location"}),
        )
        .unwrap();
    service
        .dispatch(
            "upload-photos",
            ActorKind::Customer,
            json!({"label": "Front entrance"}),
        )
        .unwrap();
    service
        .dispatch("submit-photos", ActorKind::Customer, Value::Null)
        .unwrap();
    separator();
    println!(
        "  {} {} photos submitted for review",
        "├".dimmed(),
        service.record().photos.uploaded.to_string().yellow()
    );
    show_state(&service);

    service
        .dispatch(
            "request-changes",
            ActorKind::Admin,
            json!({"note": "panel photo is too dark"}),
        )
        .unwrap();
    separator();
    println!("  {} admin requests changes: panel photo is too dark", "├".dimmed());
    show_state(&service);

    service
        .dispatch(
            "upload-photos",
            ActorKind::Customer,
            json!({"label": "Panel location, retake"}),
        )
        .unwrap();
    service
        .dispatch("submit-photos", ActorKind::Customer, Value::Null)
        .unwrap();
    service
        .dispatch("approve-and-enable", ActorKind::Admin, Value::Null)
        .unwrap();
    separator();
    println!(
        "  {} resubmitted with {} photos, approved, acceptance enabled",
        "├".dimmed(),
        service.record().photos.uploaded.to_string().yellow()
    );
    show_state(&service);

    // ── Part 3: Acceptance and Invoice ──────────────────────────────
    header("Part 3: Acceptance and Invoice");

    service
        .dispatch("accept", ActorKind::Customer, Value::Null)
        .unwrap();

    let invoice = service.record().invoice.as_ref().unwrap();
    println!(
        "  {} invoice {} issued",
        "├".dimmed(),
        invoice.id.to_string().green()
    );
    println!(
        "  {} total:   {}",
        "├".dimmed(),
        format!("{} minor units", invoice.total_minor).yellow()
    );
    show_state(&service);

    // ── Part 4: Payments ────────────────────────────────────────────
    header("Part 4: Payments in Minor Units");

    service
        .dispatch(
            "pay-partial",
            ActorKind::Customer,
            json!({"amount_minor": 20_000}),
        )
        .unwrap();
    let invoice = service.record().invoice.as_ref().unwrap();
    println!(
        "  {} partial payment: paid {} of {}, balance {}",
        "├".dimmed(),
        invoice.paid_minor.to_string().green(),
        invoice.total_minor.to_string().yellow(),
        invoice.balance_minor().to_string().red()
    );
    show_state(&service);

    service
        .dispatch("pay-full", ActorKind::Customer, Value::Null)
        .unwrap();
    let invoice = service.record().invoice.as_ref().unwrap();
    separator();
    println!(
        "  {} final payment: paid {} of {}, balance {}",
        "├".dimmed(),
        invoice.paid_minor.to_string().green(),
        invoice.total_minor.to_string().yellow(),
        invoice.balance_minor().to_string().green()
    );
    show_state(&service);

    // ── Part 5: Journals ────────────────────────────────────────────
    header("Part 5: Event Log");

    let events: Vec<_> = service.events().collect();
    for (i, entry) in events.iter().enumerate() {
        let prefix = if i < events.len() - 1 { "├" } else { "└" };
        let details = if entry.details.is_empty() {
            String::new()
        } else {
            format!("  ({})", entry.details)
        };
        println!(
            "  {} [{}] {}{}",
            prefix.dimmed(),
            entry.actor.to_string().blue(),
            entry.action_label.green(),
            details.dimmed()
        );
    }

    header("Part 6: Simulated API Trace");

    let calls: Vec<_> = service.api_calls().collect();
    for (i, call) in calls.iter().enumerate() {
        let prefix = if i < calls.len() - 1 { "├" } else { "└" };
        println!(
            "  {} {} {} {}",
            prefix.dimmed(),
            call.method.to_string().yellow(),
            call.endpoint.blue(),
            format!("{}ms", call.duration_ms).dimmed()
        );
    }

    // ── Summary ─────────────────────────────────────────────────────
    header("Summary");
    println!(
        "  {} final status:    {}",
        "├".dimmed(),
        service.display_status().label().green()
    );
    println!(
        "  {} actions applied: {}",
        "├".dimmed(),
        service.version().to_string().yellow()
    );
    println!(
        "  {} events logged:   {}",
        "├".dimmed(),
        service.events().count().to_string().yellow()
    );
    println!(
        "  {} api calls:       {}",
        "└".dimmed(),
        service.api_calls().count().to_string().yellow()
    );
    println!();
}
