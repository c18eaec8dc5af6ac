use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use check_client::{ClientConfig, SAMPLE_AMOUNT_IN_WORDS};
use check_template::{
    print_check_pdf, resolve_pdf_url, BankId, CheckValues, LayoutConfig, OverlayEngine,
    PageGeometry, RenderMode, RenderValues,
};
use check_text::{format_amount_with_spaces, format_date_fr, format_iso_date_fr, parse_amount};
use pdf_core::PdfDocument;
use tracing::info;

use super::open_store;

/// Options of `checkfill render`
#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub id: BankId,
    pub mode: RenderMode,
    /// Local check template
    pub pdf: Option<PathBuf>,
    /// Download the bank's PDF from the server
    pub fetch_pdf: bool,
    pub out: Option<PathBuf>,
    pub json: bool,
    pub presentation_width: Option<f64>,
    pub city: Option<String>,
    pub date: Option<String>,
    pub payee: Option<String>,
    pub amount: Option<String>,
    pub amount_in_words: Option<String>,
    pub reference: Option<String>,
}

pub async fn cmd_render(
    store_path: &Path,
    layout: &LayoutConfig,
    client: &ClientConfig,
    args: &RenderArgs,
) -> Result<()> {
    if args.out.is_none() && !args.json {
        bail!("nothing to do: pass --out and/or --json");
    }

    let store = open_store(store_path)?;
    let bank = store.get_bank(args.id)?;
    let input = check_values(args, chrono::Local::now().date_naive())?;

    let template = load_template(args, client, bank.pdf_url.as_deref()).await?;
    let page = match &template {
        Some(bytes) => {
            let size = PdfDocument::open_from_bytes(bytes)?.page_size(1)?;
            Some(PageGeometry::from_native(size.width, size.height))
        }
        None => None,
    };

    let engine = OverlayEngine::new(layout.clone());
    let values = RenderValues::for_positions(&bank.positions, &layout.measure(), &input);
    let overlay = match args.presentation_width {
        Some(width) => engine.render_scaled(&bank.positions, &values, args.mode, page, width),
        None => engine.render(&bank.positions, &values, args.mode, page),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&overlay)?);
    }

    if let Some(out) = &args.out {
        let pdf = print_check_pdf(template.as_deref(), &overlay)?;
        std::fs::write(out, &pdf).with_context(|| format!("failed to write {}", out.display()))?;
        info!(bank_id = %bank.id, mode = %args.mode, path = %out.display(), "check rendered");
        println!("Wrote {} ({} bytes)", out.display(), pdf.len());
    }
    Ok(())
}

/// Template bytes from `--pdf`, or downloaded with `--fetch-pdf`
async fn load_template(
    args: &RenderArgs,
    client: &ClientConfig,
    pdf_url: Option<&str>,
) -> Result<Option<Vec<u8>>> {
    if let Some(path) = &args.pdf {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(Some(bytes));
    }
    if !args.fetch_pdf {
        return Ok(None);
    }

    let Some(url) = resolve_pdf_url(&client.base_url()?, pdf_url) else {
        println!("Bank {} has no PDF, rendering without background", args.id);
        return Ok(None);
    };

    let response = reqwest::get(url.clone())
        .await
        .with_context(|| format!("failed to fetch {url}"))?
        .error_for_status()
        .with_context(|| format!("failed to fetch {url}"))?;
    let bytes = response.bytes().await?;
    info!(%url, size = bytes.len(), "check template downloaded");
    Ok(Some(bytes.to_vec()))
}

/// Check values from the command line
///
/// Calibration fills missing values with samples; printing requires every
/// field except the reference.
fn check_values(args: &RenderArgs, today: NaiveDate) -> Result<CheckValues> {
    let sample = args.mode == RenderMode::Calibration;
    let field = |value: &Option<String>, flag: &str, fallback: &str| -> Result<String> {
        match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Ok(v.to_string()),
            None if sample => Ok(fallback.to_string()),
            None => bail!("missing --{flag} for print mode"),
        }
    };

    let amount = match args.amount.as_deref() {
        Some(raw) => {
            if parse_amount(raw).is_none() {
                bail!("invalid amount '{raw}'");
            }
            format_amount_with_spaces(raw)
        }
        None if sample => "50,342".to_string(),
        None => bail!("missing --amount for print mode"),
    };

    let date = field(&args.date, "date", &format_date_fr(today))?;
    let date = format_iso_date_fr(&date).unwrap_or(date);

    Ok(CheckValues {
        city: field(&args.city, "city", "Alger")?,
        date,
        payee: field(&args.payee, "payee", "M. Exemple Bénéficiaire")?,
        amount,
        amount_in_words: field(&args.amount_in_words, "amount-in-words", SAMPLE_AMOUNT_IN_WORDS)?,
        reference: args.reference.clone().unwrap_or_default(),
    })
}
