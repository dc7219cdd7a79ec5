//! Server-rendered page for the read view

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::domain::{Item, StockFilter};

const STYLE: &str = r"
body { font-family: 'Nunito', sans-serif; background-color: #FFF5E6; color: #4A4A4A; margin: 0; padding: 20px; }
h1 { text-align: center; color: #FF9999; font-size: 2.5em; margin: 20px 0; }
.meta { text-align: center; font-size: 0.9em; color: #999; }
.filter-container { text-align: center; margin-bottom: 20px; }
.filter-container select { padding: 5px 10px; font-size: 1em; border-radius: 5px; border: 1px solid #FF9999; background-color: #FFF; color: #4A4A4A; }
.products-container { display: flex; flex-wrap: wrap; justify-content: center; gap: 20px; }
.product { background-color: #FFF; border-radius: 15px; box-shadow: 0 4px 8px rgba(0,0,0,0.1); padding: 15px; width: 200px; text-align: center; position: relative; overflow: hidden; }
.product img { max-width: 100%; height: auto; border-radius: 10px; }
.product a { text-decoration: none; color: inherit; }
.product h3 { font-size: 1em; margin: 10px 0; }
.product p { font-weight: bold; color: #FF9999; }
.product_number { font-size: 0.8em; color: #999; margin-top: 5px; }
.sold-out { position: absolute; top: 10px; right: -35px; background-color: #FF0000; color: white; padding: 5px 40px; transform: rotate(45deg); font-size: 0.8em; font-weight: bold; }
";

/// Render the item grid for `items`, already filtered by `filter`
pub fn render_items_page(items: &[Item], filter: StockFilter, generation_note: &str) -> String {
    let mut page = String::with_capacity(4096 + items.len() * 512);
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    page.push_str("<title>Chiikawa Market Tracker</title>\n<style>");
    page.push_str(STYLE);
    page.push_str("</style>\n</head>\n<body>\n<h1>Chiikawa Market Tracker</h1>\n");

    let _ = writeln!(page, "<div class=\"meta\">{}</div>", encode_text(generation_note));

    page.push_str("<div class=\"filter-container\">\n<label for=\"filter\">Filter: </label>\n");
    page.push_str(
        "<select id=\"filter\" onchange=\"window.location.href='?filter=' + this.value\">\n",
    );
    for option in StockFilter::VARIANTS {
        let selected = if option == filter { " selected" } else { "" };
        let _ = writeln!(
            page,
            "<option value=\"{}\"{}>{}</option>",
            option.as_str(),
            selected,
            option.label()
        );
    }
    page.push_str("</select>\n</div>\n<div class=\"products-container\">\n");

    for item in items {
        render_item(&mut page, item);
    }

    page.push_str("</div>\n</body>\n</html>\n");
    page
}

fn render_item(page: &mut String, item: &Item) {
    page.push_str("<div class=\"product\">\n");
    if item.is_sold_out {
        page.push_str("<div class=\"sold-out\">売り切れ</div>\n");
    }
    let _ = writeln!(
        page,
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">",
        encode_double_quoted_attribute(&item.product_url)
    );
    if !item.photo_url.is_empty() {
        let _ = writeln!(
            page,
            "<img src=\"{}\" alt=\"{}\">",
            encode_double_quoted_attribute(&image_src(&item.photo_url)),
            encode_double_quoted_attribute(&item.name)
        );
    }
    let _ = writeln!(page, "<h3>{}</h3>", encode_text(&item.name));
    let _ = writeln!(page, "<p>{}</p>", encode_text(&item.price));
    let _ = writeln!(
        page,
        "<div class=\"product_number\">{}</div>",
        encode_text(&item.identity_key)
    );
    page.push_str("</a>\n</div>\n");
}

/// Listing photos are protocol-relative (`//cdn/...`)
fn image_src(photo_url: &str) -> String {
    if photo_url.starts_with("//") {
        format!("https:{photo_url}")
    } else {
        photo_url.to_string()
    }
}
