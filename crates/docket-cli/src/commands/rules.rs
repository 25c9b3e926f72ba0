//! Rules command implementation.

use crate::cli::RulesArgs;
use crate::error::Result;
use crate::output::Formatter;
use docket_extractor::LegalGraphBuilder;
use tracing::debug;

/// Print the rules of procedure for a jurisdiction, plus the statutes and
/// elements of any requested claim types.
pub fn execute_rules(args: RulesArgs, formatter: &Formatter) -> Result<()> {
    let builder = LegalGraphBuilder::new();
    let graph = if args.claim_types.is_empty() {
        builder.build_rules_of_procedure(&args.jurisdiction)
    } else {
        builder.build_for_claim_types(&args.claim_types, &args.jurisdiction)
    };

    debug!(
        jurisdiction = %args.jurisdiction,
        elements = graph.element_count(),
        "Built rules graph"
    );
    println!("{}", formatter.format_rules(&graph)?);
    Ok(())
}
