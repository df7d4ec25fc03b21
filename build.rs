use std::process::Command;

/// Plain CSS used when the Tailwind CLI is not installed. Covers the
/// component classes from `assets/css/input.css`.
const FALLBACK_CSS: &str = r#"*, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, sans-serif; line-height: 1.6; color: #1c1917; background: #fafaf9; }
a { color: inherit; }
h1 { font-size: 1.75rem; margin-bottom: 1rem; }
h2 { font-size: 1.25rem; margin: 1rem 0 0.5rem; }
ul, ol { padding-left: 1.5rem; }
.site-header { border-bottom: 1px solid #e7e5e4; background: #fff; }
.nav-level { max-width: 56rem; margin: 0 auto; display: flex; flex-wrap: wrap; gap: 0.75rem; padding: 0.5rem 1rem; font-size: 0.875rem; }
.nav-level-1 { background: #fafaf9; }
.nav-link { color: #57534e; text-decoration: none; background: none; border: none; font: inherit; cursor: pointer; }
.nav-link.current { color: #1c1917; font-weight: 600; text-decoration: underline; }
.nav-form { display: inline; }
.page { max-width: 56rem; margin: 0 auto; padding: 2rem 1rem; }
.flash { margin-bottom: 1rem; border-radius: 0.5rem; border: 1px solid #bbf7d0; background: #f0fdf4; padding: 0.75rem 1rem; font-size: 0.875rem; }
.flash-error { border-color: #fecaca; background: #fef2f2; color: #7f1d1d; }
.card { margin-bottom: 1rem; background: #fff; border-radius: 0.75rem; border: 1px solid #e7e5e4; padding: 1.5rem; }
.muted { font-size: 0.875rem; color: #78716c; }
.btn { display: inline-flex; align-items: center; padding: 0.5rem 1rem; border-radius: 0.5rem; font-size: 0.875rem; font-weight: 500; cursor: pointer; text-decoration: none; border: none; }
.btn-primary { background: #1c1917; color: #fff; }
.btn-secondary { background: #fff; color: #1c1917; border: 1px solid #d6d3d1; }
.btn-danger { background: #b91c1c; color: #fff; }
.btn-small { padding: 0.25rem 0.5rem; font-size: 0.75rem; }
.field { display: flex; flex-direction: column; gap: 0.25rem; margin-bottom: 1rem; }
.field input, .field textarea, .field select { border: 1px solid #d6d3d1; border-radius: 0.5rem; padding: 0.5rem 0.75rem; font: inherit; }
.tabs { display: flex; gap: 0.5rem; border-bottom: 1px solid #e7e5e4; margin-bottom: 1rem; }
.tab { padding: 0.5rem 0.75rem; font-size: 0.875rem; color: #78716c; background: none; border: none; cursor: pointer; }
.tab.active { color: #1c1917; font-weight: 600; border-bottom: 2px solid #1c1917; }
.row-table { width: 100%; font-size: 0.875rem; }
.row-table td { padding: 0.25rem 0.5rem 0.25rem 0; }
.row-table input, .row-table textarea { width: 100%; border: 1px solid #d6d3d1; border-radius: 0.25rem; padding: 0.25rem 0.5rem; font: inherit; }
.pager { margin-top: 1.5rem; display: flex; align-items: center; justify-content: space-between; font-size: 0.875rem; }
.rating { color: #d97706; }
"#;

fn main() {
    // Only rebuild CSS when template or CSS files change
    println!("cargo:rerun-if-changed=assets/css/input.css");
    println!("cargo:rerun-if-changed=templates/");

    let status = Command::new("tailwindcss")
        .args([
            "-i",
            "assets/css/input.css",
            "-o",
            "assets/css/output.css",
            "--minify",
        ])
        .status();

    match status {
        Ok(s) if s.success() => {
            println!("cargo:warning=Tailwind CSS compiled successfully");
        }
        _ => {
            println!("cargo:warning=Tailwind CLI not found, using fallback CSS");
            std::fs::create_dir_all("assets/css").ok();
            std::fs::write("assets/css/output.css", FALLBACK_CSS).ok();
        }
    }
}
