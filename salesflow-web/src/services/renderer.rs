//! Dossier PDF renderer
//!
//! Builds the sales dossier with the built-in Helvetica fonts: a portrait
//! cover page followed by one landscape page per item, grouped by section
//! in dossier order. Product images stay as catalog URLs in the item notes
//! area; the pages are text-first so they render without network access.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};
use serde::Deserialize;
use thiserror::Error;

use salesflow_common::dossier::{Item, Section};

// A4 portrait and landscape dimensions in millimeters
const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const LAND_W: f64 = 297.0;
const LAND_H: f64 = 210.0;

const MARGIN: f64 = 18.0;
const PRICE_PLACEHOLDER: &str = "Precio bajo consulta";

/// Lowest baseline for flowing item text; the price band sits below this
const CONTENT_FLOOR: f64 = 40.0;
const LINE_HEIGHT: f64 = 5.5;

/// Errors from PDF generation
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),
}

/// Everything needed to render one dossier
#[derive(Debug, Deserialize)]
pub struct DossierDocument {
    pub sections: Vec<Section>,
    pub client_name: String,
    pub project_name: String,
    pub date: String,
    pub salesperson: String,
    pub hide_prices: bool,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Render the dossier to PDF bytes
pub fn render_pdf(document: &DossierDocument) -> Result<Vec<u8>, RenderError> {
    let title = if document.project_name.is_empty() {
        "Dossier".to_string()
    } else {
        format!("Dossier - {}", document.project_name)
    };

    let (doc, cover_page, cover_layer) =
        PdfDocument::new(&title, mm(PAGE_W), mm(PAGE_H), "Cover");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
    };

    let layer = doc.get_page(cover_page).get_layer(cover_layer);
    draw_cover(&layer, &fonts, document);

    for section in &document.sections {
        for item in &section.items {
            let (page, layer_idx) = doc.add_page(mm(LAND_W), mm(LAND_H), "Item");
            let layer = doc.get_page(page).get_layer(layer_idx);
            draw_item_page(&layer, &fonts, &section.name, item, document.hide_prices);
        }
    }

    Ok(doc.save_to_bytes()?)
}

fn draw_cover(layer: &PdfLayerReference, fonts: &Fonts, document: &DossierDocument) {
    layer.set_fill_color(dark());
    layer.use_text("BACCESSORY", 28.0, mm(MARGIN), mm(PAGE_H - 40.0), &fonts.bold);
    layer.use_text(
        "Luxury Fixtures & Fittings",
        11.0,
        mm(MARGIN),
        mm(PAGE_H - 48.0),
        &fonts.regular,
    );
    rule(layer, MARGIN, PAGE_W - MARGIN, PAGE_H - 56.0);

    let project = if document.project_name.is_empty() {
        "Propuesta Comercial"
    } else {
        &document.project_name
    };
    layer.use_text(project, 22.0, mm(MARGIN), mm(PAGE_H - 120.0), &fonts.bold);

    let mut y = PAGE_H - 140.0;
    let mut field = |label: &str, value: &str| {
        if value.is_empty() {
            return;
        }
        layer.set_fill_color(gray());
        layer.use_text(label, 10.0, mm(MARGIN), mm(y), &fonts.regular);
        layer.set_fill_color(dark());
        layer.use_text(value, 12.0, mm(MARGIN + 40.0), mm(y), &fonts.regular);
        y -= 10.0;
    };
    field("Cliente", &document.client_name);
    field("Asesor", &document.salesperson);
    field("Fecha", &document.date);

    let item_count: usize = document.sections.iter().map(|s| s.items.len()).sum();
    field("Productos", &item_count.to_string());

    if !document.hide_prices {
        let total: f64 = document
            .sections
            .iter()
            .flat_map(|s| &s.items)
            .map(Item::effective_price)
            .sum();
        field("Total estimado", &format_price(total, false));
    }
}

fn draw_item_page(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    section_name: &str,
    item: &Item,
    hide_prices: bool,
) {
    layer.set_fill_color(gray());
    layer.use_text("BACCESSORY", 10.0, mm(MARGIN), mm(LAND_H - 14.0), &fonts.bold);
    layer.use_text(section_name, 10.0, mm(LAND_W - 90.0), mm(LAND_H - 14.0), &fonts.regular);
    rule(layer, MARGIN, LAND_W - MARGIN, LAND_H - 18.0);

    layer.set_fill_color(gray());
    layer.use_text(&item.brand, 12.0, mm(MARGIN), mm(LAND_H - 32.0), &fonts.regular);
    layer.set_fill_color(dark());
    layer.use_text(&item.name, 20.0, mm(MARGIN), mm(LAND_H - 42.0), &fonts.bold);

    let mut y = LAND_H - 56.0;
    let mut field = |label: &str, value: &str| {
        if value.is_empty() {
            return;
        }
        layer.set_fill_color(gray());
        layer.use_text(label, 9.0, mm(MARGIN), mm(y), &fonts.regular);
        layer.set_fill_color(dark());
        layer.use_text(value, 11.0, mm(MARGIN + 35.0), mm(y), &fonts.regular);
        y -= 8.0;
    };

    field("SKU", &item.sku);
    if let Some(collection) = &item.collection_name {
        field("Coleccion", collection);
    }
    if let Some(finish) = &item.finish {
        field("Acabado", finish);
    }
    if let Some(warranty_type) = &item.warranty_type {
        let warranty = match &item.warranty_duration {
            Some(duration) => format!("{} ({})", warranty_type, duration),
            None => warranty_type.clone(),
        };
        field("Garantia", &warranty);
    }
    if !item.image_url.is_empty() {
        field("Imagen", &item.image_url);
    }

    y -= 4.0;
    if !item.description.is_empty() && y > CONTENT_FLOOR {
        layer.set_fill_color(dark());
        let lines = wrap_text(&item.description, 95);
        for line in lines.iter().take(lines_that_fit(y, LINE_HEIGHT, CONTENT_FLOOR)) {
            layer.use_text(line, 10.0, mm(MARGIN), mm(y), &fonts.regular);
            y -= LINE_HEIGHT;
        }
        y -= 4.0;
    }

    if !item.features.is_empty() && y > CONTENT_FLOOR {
        layer.set_fill_color(gray());
        layer.use_text("Caracteristicas", 9.0, mm(MARGIN), mm(y), &fonts.regular);
        y -= 6.0;
        layer.set_fill_color(dark());
        let mut budget = lines_that_fit(y, LINE_HEIGHT, CONTENT_FLOOR);
        'features: for feature in &item.features {
            for line in wrap_text(feature, 90) {
                if budget == 0 {
                    break 'features;
                }
                layer.use_text(&format!("- {}", line), 10.0, mm(MARGIN + 4.0), mm(y), &fonts.regular);
                y -= LINE_HEIGHT;
                budget -= 1;
            }
        }
        y -= 4.0;
    }

    if !item.note.is_empty() && y > CONTENT_FLOOR {
        layer.set_fill_color(gray());
        layer.use_text("Nota", 9.0, mm(MARGIN), mm(y), &fonts.regular);
        y -= 6.0;
        layer.set_fill_color(dark());
        let lines = wrap_text(&item.note, 95);
        for line in lines.iter().take(lines_that_fit(y, LINE_HEIGHT, CONTENT_FLOOR)) {
            layer.use_text(line, 10.0, mm(MARGIN + 4.0), mm(y), &fonts.regular);
            y -= LINE_HEIGHT;
        }
    }

    // Price block, bottom right
    rule(layer, LAND_W - 100.0, LAND_W - MARGIN, 34.0);
    layer.set_fill_color(dark());
    if hide_prices {
        layer.use_text(PRICE_PLACEHOLDER, 12.0, mm(LAND_W - 100.0), mm(26.0), &fonts.bold);
    } else {
        if item.discount > 0.0 {
            layer.set_fill_color(gray());
            layer.use_text(
                &format!("{}  -{}%", format_price(item.price, false), item.discount),
                9.0,
                mm(LAND_W - 100.0),
                mm(30.0),
                &fonts.regular,
            );
            layer.set_fill_color(dark());
        }
        layer.use_text(
            &format_price(item.effective_price(), false),
            14.0,
            mm(LAND_W - 100.0),
            mm(22.0),
            &fonts.bold,
        );
    }
}

fn rule(layer: &PdfLayerReference, x1: f64, x2: f64, y: f64) {
    layer.set_outline_color(gray());
    layer.set_outline_thickness(0.4);
    layer.add_line(Line {
        points: vec![
            (Point::new(mm(x1), mm(y)), false),
            (Point::new(mm(x2), mm(y)), false),
        ],
        is_closed: false,
    });
}

fn mm(value: f64) -> Mm {
    Mm(value as _)
}

/// Number of text lines that fit between a starting baseline and the floor
fn lines_that_fit(y: f64, line_height: f64, floor: f64) -> usize {
    if y < floor {
        return 0;
    }
    ((y - floor) / line_height) as usize + 1
}

fn dark() -> Color {
    Color::Rgb(Rgb::new(0.12, 0.12, 0.12, None))
}

fn gray() -> Color {
    Color::Rgb(Rgb::new(0.45, 0.45, 0.45, None))
}

/// Format a price, or the consult placeholder when prices are hidden
pub fn format_price(value: f64, hide: bool) -> String {
    if hide {
        return PRICE_PLACEHOLDER.to_string();
    }
    let cents = (value * 100.0).round() as i64;
    let whole = cents / 100;
    let fraction = (cents % 100).abs();

    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if whole < 0 { "-" } else { "" };
    format!("${}{}.{:02}", sign, grouped, fraction)
}

/// Greedy word wrap by approximate character count
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Build a download filename from client and project names
pub fn attachment_filename(client_name: &str, project_name: &str) -> String {
    let mut parts = vec!["Dossier".to_string()];
    for part in [client_name, project_name] {
        let clean: String = part
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let clean = clean.trim_matches('_').to_string();
        if !clean.is_empty() {
            parts.push(clean);
        }
    }
    format!("{}.pdf", parts.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_price_groups_thousands() {
        assert_eq!(format_price(1234567.5, false), "$1,234,567.50");
        assert_eq!(format_price(999.0, false), "$999.00");
        assert_eq!(format_price(0.0, false), "$0.00");
    }

    #[test]
    fn format_price_hidden() {
        assert_eq!(format_price(1234.0, true), PRICE_PLACEHOLDER);
    }

    #[test]
    fn wrap_text_respects_limit() {
        let lines = wrap_text("one two three four five six seven", 12);
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
        assert_eq!(lines.join(" "), "one two three four five six seven");
    }

    #[test]
    fn wrap_text_single_long_word_kept_whole() {
        let lines = wrap_text("supercalifragilistic", 5);
        assert_eq!(lines, vec!["supercalifragilistic"]);
    }

    #[test]
    fn lines_that_fit_respects_floor() {
        // Baselines at 51.0, 45.5, 40.0 are at or above a floor of 40.0
        assert_eq!(lines_that_fit(51.0, 5.5, 40.0), 3);
        assert_eq!(lines_that_fit(40.0, 5.5, 40.0), 1);
        assert_eq!(lines_that_fit(39.9, 5.5, 40.0), 0);
    }

    #[test]
    fn oversized_item_text_still_renders() {
        let mut item = Item {
            id: "a".to_string(),
            sku: "VL-112".to_string(),
            name: "Basin Mixer".to_string(),
            price: 420.0,
            image_url: String::new(),
            brand: "Vola".to_string(),
            description: "long words here ".repeat(400),
            collection_name: None,
            finish: None,
            item_type: None,
            discount: 0.0,
            note: "note text ".repeat(300),
            features: Vec::new(),
            warranty_type: None,
            warranty_duration: None,
        };
        item.features = (0..50).map(|i| format!("Feature number {}", i)).collect();

        let document = DossierDocument {
            sections: vec![Section {
                id: "unassigned".to_string(),
                name: "Productos".to_string(),
                items: vec![item],
            }],
            client_name: String::new(),
            project_name: String::new(),
            date: String::new(),
            salesperson: String::new(),
            hide_prices: false,
        };

        let bytes = render_pdf(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn attachment_filename_sanitized() {
        assert_eq!(
            attachment_filename("Grupo Flora", "Villa 7 / Fase 2"),
            "Dossier_Grupo_Flora_Villa_7___Fase_2.pdf"
        );
        assert_eq!(attachment_filename("", ""), "Dossier.pdf");
    }

    #[test]
    fn renders_nonempty_pdf() {
        let document = DossierDocument {
            sections: vec![Section {
                id: "unassigned".to_string(),
                name: "Productos".to_string(),
                items: vec![Item {
                    id: "a".to_string(),
                    sku: "VL-112".to_string(),
                    name: "Basin Mixer".to_string(),
                    price: 420.0,
                    image_url: "https://example.com/mixer.jpg".to_string(),
                    brand: "Vola".to_string(),
                    description: "Single-lever basin mixer in brushed gold.".to_string(),
                    collection_name: Some("111".to_string()),
                    finish: Some("Brushed Gold".to_string()),
                    item_type: None,
                    discount: 10.0,
                    note: "Client prefers matte finish".to_string(),
                    features: vec!["Ceramic cartridge".to_string()],
                    warranty_type: Some("Fabricante".to_string()),
                    warranty_duration: Some("5 anos".to_string()),
                }],
            }],
            client_name: "Grupo Flora".to_string(),
            project_name: "Villa Flora".to_string(),
            date: "2025-03-01".to_string(),
            salesperson: "Seller".to_string(),
            hide_prices: false,
        };

        let bytes = render_pdf(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }
}
