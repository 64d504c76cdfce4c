//! `sitekeep analyze <bundle.zip>`

use sitekeep_core::{SiteAnalysis, analyze_bundle};
use tracing::debug;

use crate::cli::{AnalyzeArgs, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Field};

pub async fn handle(args: &AnalyzeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let bytes = tokio::fs::read(&args.bundle)
        .await
        .map_err(|source| CliError::Bundle {
            path: args.bundle.clone(),
            source,
        })?;
    debug!(path = %args.bundle.display(), size = bytes.len(), "analyzing bundle");

    let analysis = analyze_bundle(&bytes);
    let out = output::render_single(global.output, &analysis, detail)?;
    output::print_output(&out);
    Ok(())
}

fn detail(a: &SiteAnalysis) -> String {
    let or_dash = |s: &str| if s.is_empty() { "-".to_owned() } else { s.to_owned() };
    let rows = [
        Field::new("Title", or_dash(&a.title)),
        Field::new("Description", or_dash(&a.description)),
        Field::new("SEO score", a.seo_score),
        Field::new("Pages", a.page_count),
        Field::new("Scripts", a.script_count),
        Field::new("Headings", a.heading_count),
        Field::new("Links", a.link_count),
        Field::new(
            "Favicon",
            a.favicon.as_ref().map_or_else(|| "-".to_owned(), |f| f.path.clone()),
        ),
    ];

    let mut out = output::render_table(&rows);
    let suggestions = a.suggestions();
    if !suggestions.is_empty() {
        out.push_str("\n\nSuggestions:");
        for s in suggestions {
            out.push_str("\n  - ");
            out.push_str(&s);
        }
    }
    out
}
