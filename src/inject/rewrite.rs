//! Site rewriting
//!
//! Each pending site's builder expression is wrapped in the registration
//! call: `Client::builder()` becomes `wrapper(Client::builder())`. The
//! wrapper takes the builder, attaches the installed observer factory, and
//! returns the builder, so any chained configuration after the site is
//! untouched.

use super::scanner::InjectionSite;

/// Apply the wrapper to every uninstrumented site.
///
/// `sites` must be in order of appearance (as produced by the scanner);
/// patches are applied back to front so earlier offsets stay valid.
pub fn apply(source: &str, sites: &[InjectionSite], wrapper_path: &str) -> String {
    let mut output = source.to_string();
    let open = format!("{}(", wrapper_path);

    for site in sites.iter().rev() {
        if site.instrumented {
            continue;
        }
        output.insert_str(site.end, ")");
        output.insert_str(site.start, &open);
    }

    output
}
