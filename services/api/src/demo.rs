use crate::infra::{InMemoryAuditSink, InMemoryLoanStore};
use clap::Args;
use loan_engine::error::AppError;
use loan_engine::workflows::loans::{
    Actor, DecisionAction, DecisionConfig, LoanApplication, LoanApplicationService,
    LoanServiceError, LoanTerms,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Submit applications but skip the reviewer decision portion of the demo
    #[arg(long)]
    pub(crate) skip_decisions: bool,
}

type DemoService = LoanApplicationService<InMemoryLoanStore, InMemoryAuditSink>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = DecisionConfig::default();
    println!("Loan decision engine demo");
    println!(
        "Auto-decision band: approve below {}, reject above {}, manual review in between",
        config.low_threshold, config.high_threshold
    );
    println!(
        "Pending cap per applicant: {}",
        config.max_pending_per_applicant
    );

    let store = Arc::new(InMemoryLoanStore::default());
    let audit = Arc::new(InMemoryAuditSink::default());
    let service = Arc::new(DemoService::new(store, audit.clone(), config));

    let applicant = Actor::applicant("demo-user");
    let reviewer = Actor::reviewer("demo-admin");

    println!("\nSubmissions");
    let samples = [
        (
            "steady income, modest loan",
            LoanTerms {
                amount: 50_000.0,
                income: 100_000.0,
                credit_score: 750,
                term_months: 60,
            },
        ),
        (
            "loan equals annual income",
            LoanTerms {
                amount: 100_000.0,
                income: 100_000.0,
                credit_score: 850,
                term_months: 36,
            },
        ),
    ];

    let mut submitted = Vec::new();
    for (label, terms) in samples {
        match service.submit(&applicant, terms) {
            Ok(application) => {
                render_application(label, &application);
                submitted.push(application);
            }
            Err(err) => println!("- {label}: rejected ({err})"),
        }
    }

    // A third pending submission trips the per-applicant cap.
    let over_cap = service.submit(
        &applicant,
        LoanTerms {
            amount: 20_000.0,
            income: 80_000.0,
            credit_score: 700,
            term_months: 24,
        },
    );
    match over_cap {
        Err(LoanServiceError::PendingLimit(denied)) => {
            println!("- third submission: blocked ({denied})");
        }
        Ok(application) => render_application("third submission", &application),
        Err(err) => println!("- third submission: rejected ({err})"),
    }

    if args.skip_decisions {
        return Ok(());
    }

    println!("\nDecisions");
    for application in &submitted {
        match service.decide(&reviewer, &application.id, None) {
            Ok(decided) => println!(
                "- {}: auto {} (risk {:.4})",
                decided.id.0,
                decided.status.label(),
                decided.risk_score
            ),
            Err(LoanServiceError::Decision(err)) => {
                println!("- {}: deferred ({err})", application.id.0);
                match service.decide(&reviewer, &application.id, Some(DecisionAction::Approve)) {
                    Ok(decided) => println!(
                        "  manual override: {} by {}",
                        decided.status.label(),
                        reviewer.applicant_id.0
                    ),
                    Err(err) => println!("  manual override failed: {err}"),
                }
            }
            Err(err) => println!("- {}: decision unavailable ({err})", application.id.0),
        }
    }

    println!("\nApplicant view");
    match service.list_for(&applicant, None) {
        Ok(loans) => {
            for loan in loans {
                match serde_json::to_string_pretty(&loan.view()) {
                    Ok(json) => println!("{json}"),
                    Err(err) => println!("  view unavailable: {err}"),
                }
            }
        }
        Err(err) => println!("  listing unavailable: {err}"),
    }

    println!("\nAudit trail");
    for event in audit.events() {
        match serde_json::to_string(&event) {
            Ok(json) => println!("- {json}"),
            Err(err) => println!("- event unavailable: {err}"),
        }
    }

    Ok(())
}

fn render_application(label: &str, application: &LoanApplication) {
    println!(
        "- {label}: {} -> {} (risk {:.4})",
        application.id.0,
        application.status.label(),
        application.risk_score
    );
}
