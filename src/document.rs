use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::{Error, Result};

/// A parsed portal page together with the url it was served from,
/// so relative links in it can be resolved.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    html: Html,
    url: Url,
}

impl HtmlDocument {
    pub fn parse(url: Url, source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Serializes the tree back into markup.
    pub fn html(&self) -> String {
        self.html.html()
    }

    pub fn select_first(&self, selector: &str) -> Result<Option<ElementRef<'_>>> {
        let selector = create_selector(selector)?;
        Ok(self.html.select(&selector).next())
    }

    pub fn select_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = create_selector(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    pub fn contains(&self, selector: &str) -> Result<bool> {
        Ok(self.select_first(selector)?.is_some())
    }

    /// Finds an element by its `id` attribute.
    /// Matches ids verbatim, ASP.NET generates ones that aren't valid CSS identifiers.
    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().id() == Some(id))
    }

    /// Text of the first element matching `selector`, `None` when nothing matches.
    pub fn text_of(&self, selector: &str) -> Result<Option<String>> {
        Ok(self.select_first(selector)?.map(text))
    }

    /// Resolves the element's `attr` against the page url, like a browser would.
    pub fn abs_url(&self, element: ElementRef<'_>, attr: &str) -> Option<Url> {
        let value = element.value().attr(attr)?.trim();
        if value.is_empty() {
            return None;
        }
        self.url.join(value).ok()
    }
}

pub(crate) fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::InvalidSelector(sel_str.into()))
}

/// All the text under the element with whitespace collapsed.
pub fn text(element: ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// Only the text nodes that are direct children of the element.
pub fn own_text(element: ElementRef<'_>) -> String {
    let own: String = element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(t) => Some(&**t),
            _ => None,
        })
        .collect();
    normalize_ws(&own)
}

/// Direct `<td>` children of a table row, in order.
pub fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name().eq_ignore_ascii_case("td"))
        .collect()
}

/// Collapses runs of whitespace (`&nbsp;` included) into single spaces and trims.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
