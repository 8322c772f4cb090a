use anyhow::Context as _;
use scraper::{ElementRef, Html, Selector};

/// CSS selectors and thresholds used to pull a chapter out of a page.
#[derive(Debug, Clone)]
pub struct ExtractSelectors {
    /// Tried in order; the first matching element is the title.
    pub titles: Vec<String>,
    /// Containers among which the one holding the most paragraphs wins.
    pub densest_container: String,
    /// Single-container fallbacks, tried in order.
    pub fallback_containers: Vec<String>,
    /// Elements whose text never reaches the chapter body.
    pub strip: Vec<String>,
    pub paragraph: String,
    /// Paragraph fallback keeps only paragraphs longer than this (in chars).
    pub min_paragraph_chars: usize,
    pub next_text: String,
    pub next_class: String,
}

impl Default for ExtractSelectors {
    fn default() -> Self {
        Self {
            titles: vec!["h1".to_owned(), "h2".to_owned(), "h3".to_owned()],
            densest_container: "div.text-left".to_owned(),
            fallback_containers: vec![
                "div.entry-content".to_owned(),
                "div.reading-content".to_owned(),
            ],
            strip: vec![
                "script".to_owned(),
                "style".to_owned(),
                ".code-block".to_owned(),
            ],
            paragraph: "p".to_owned(),
            min_paragraph_chars: 20,
            next_text: "Next".to_owned(),
            next_class: "a.next_page".to_owned(),
        }
    }
}

/// One way of locating the chapter body. Strategies are tried in order and
/// the first one that matches decides the content, even if its text is empty.
#[derive(Debug, Clone)]
pub enum ContentStrategy {
    DensestContainer(Selector),
    FirstContainer(Selector),
    LongParagraphs { min_chars: usize },
}

impl ContentStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ContentStrategy::DensestContainer(_) => "densest-container",
            ContentStrategy::FirstContainer(_) => "first-container",
            ContentStrategy::LongParagraphs { .. } => "long-paragraphs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub content: String,
    pub strategy: &'static str,
    pub next_href: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageExtractor {
    titles: Vec<Selector>,
    strategies: Vec<ContentStrategy>,
    paragraph: Selector,
    strip: Vec<Selector>,
    anchor: Selector,
    next_text: String,
    next_class: Selector,
}

impl PageExtractor {
    pub fn new(selectors: &ExtractSelectors) -> anyhow::Result<Self> {
        let titles = selectors
            .titles
            .iter()
            .map(|css| parse_selector(css))
            .collect::<anyhow::Result<Vec<_>>>()
            .context("parse title selectors")?;

        let mut strategies = vec![ContentStrategy::DensestContainer(
            parse_selector(&selectors.densest_container).context("parse container selector")?,
        )];
        for css in &selectors.fallback_containers {
            strategies.push(ContentStrategy::FirstContainer(
                parse_selector(css).context("parse fallback container selector")?,
            ));
        }
        strategies.push(ContentStrategy::LongParagraphs {
            min_chars: selectors.min_paragraph_chars,
        });

        let strip = selectors
            .strip
            .iter()
            .map(|css| parse_selector(css))
            .collect::<anyhow::Result<Vec<_>>>()
            .context("parse strip selectors")?;

        Ok(Self {
            titles,
            strategies,
            paragraph: parse_selector(&selectors.paragraph).context("parse paragraph selector")?,
            strip,
            anchor: parse_selector("a")?,
            next_text: selectors.next_text.clone(),
            next_class: parse_selector(&selectors.next_class).context("parse next selector")?,
        })
    }

    pub fn strategies(&self) -> &[ContentStrategy] {
        &self.strategies
    }

    pub fn extract_page(&self, html: &str) -> ExtractedPage {
        let document = Html::parse_document(html);
        let (strategy, content) = self.content(&document);
        ExtractedPage {
            title: self.title(&document),
            content,
            strategy,
            next_href: self.next_link(&document),
        }
    }

    pub fn next_link_in(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        self.next_link(&document)
    }

    fn title(&self, document: &Html) -> Option<String> {
        self.titles.iter().find_map(|selector| {
            document
                .select(selector)
                .next()
                .map(|element| element.text().map(str::trim).collect::<String>())
        })
    }

    fn content(&self, document: &Html) -> (&'static str, String) {
        for strategy in &self.strategies {
            if let Some(text) = self.apply(strategy, document) {
                return (strategy.name(), text.trim().to_owned());
            }
        }
        ("none", String::new())
    }

    fn apply(&self, strategy: &ContentStrategy, document: &Html) -> Option<String> {
        match strategy {
            ContentStrategy::DensestContainer(container) => {
                let mut best: Option<(ElementRef<'_>, usize)> = None;
                for candidate in document.select(container) {
                    let paragraphs = candidate.select(&self.paragraph).count();
                    if best.is_none_or(|(_, most)| paragraphs > most) {
                        best = Some((candidate, paragraphs));
                    }
                }
                best.map(|(element, _)| self.sanitized_text(element))
            }
            ContentStrategy::FirstContainer(container) => document
                .select(container)
                .next()
                .map(|element| self.sanitized_text(element)),
            ContentStrategy::LongParagraphs { min_chars } => {
                let paragraphs = document
                    .select(&self.paragraph)
                    .map(|p| p.text().map(str::trim).collect::<String>())
                    .filter(|text| text.chars().count() > *min_chars)
                    .collect::<Vec<_>>();
                Some(paragraphs.join("\n\n"))
            }
        }
    }

    fn sanitized_text(&self, container: ElementRef<'_>) -> String {
        let mut pieces = Vec::new();
        collect_text(container, &self.strip, &mut pieces);
        pieces.join("\n\n")
    }

    fn next_link(&self, document: &Html) -> Option<String> {
        let by_text = document
            .select(&self.anchor)
            .find(|a| a.text().collect::<String>().contains(&self.next_text));
        let anchor = by_text.or_else(|| document.select(&self.next_class).next())?;
        anchor.value().attr("href").map(str::to_owned)
    }
}

fn collect_text(element: ElementRef<'_>, strip: &[Selector], out: &mut Vec<String>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if strip.iter().any(|selector| selector.matches(&child_element)) {
                continue;
            }
            collect_text(child_element, strip, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_owned());
            }
        }
    }
}

fn parse_selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("invalid css selector {css:?}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> PageExtractor {
        PageExtractor::new(&ExtractSelectors::default()).expect("default selectors parse")
    }

    #[test]
    fn title_prefers_h1_then_h2_then_h3() {
        let page = extractor().extract_page(
            "<html><body><h3>Third</h3><h2>  Second  </h2><p>short</p></body></html>",
        );
        assert_eq!(page.title.as_deref(), Some("Second"));

        let page = extractor().extract_page("<h2>Two</h2><h1> <span>Chapter</span> 1 </h1>");
        assert_eq!(page.title.as_deref(), Some("Chapter1"));

        let page = extractor().extract_page("<p>no headings here</p>");
        assert_eq!(page.title, None);
    }

    #[test]
    fn densest_container_wins_and_ties_go_to_first() {
        let html = r#"
            <div class="text-left"><p>nav one</p></div>
            <div class="text-left"><p>First body A</p><p>First body B</p></div>
            <div class="text-left"><p>Second body A</p><p>Second body B</p></div>
        "#;
        let page = extractor().extract_page(html);
        assert_eq!(page.strategy, "densest-container");
        assert_eq!(page.content, "First body A\n\nFirst body B");
    }

    #[test]
    fn container_text_skips_scripts_styles_and_ad_blocks() {
        let html = r#"
            <div class="entry-content">
              <p>Line one</p>
              <script>var tracking = 1;</script>
              <style>.x { color: red; }</style>
              <div class="code-block code-block-3"><p>Buy now</p></div>
              <p>Line <em>two</em></p>
            </div>
        "#;
        let page = extractor().extract_page(html);
        assert_eq!(page.strategy, "first-container");
        assert_eq!(page.content, "Line one\n\nLine\n\ntwo");
    }

    #[test]
    fn fallback_containers_follow_priority_order() {
        let html = r#"
            <div class="reading-content"><p>reading</p></div>
            <div class="entry-content"><p>entry</p></div>
        "#;
        assert_eq!(extractor().extract_page(html).content, "entry");
    }

    #[test]
    fn long_paragraph_fallback_keeps_only_paragraphs_over_twenty_chars() {
        let html = r#"
            <p>too short</p>
            <p>exactly twenty chars</p>
            <p>This paragraph is long enough.</p>
            <p>  Another  long enough paragraph  </p>
        "#;
        let page = extractor().extract_page(html);
        assert_eq!(page.strategy, "long-paragraphs");
        assert_eq!(
            page.content,
            "This paragraph is long enough.\n\nAnother  long enough paragraph"
        );
    }

    #[test]
    fn matched_empty_container_does_not_fall_through() {
        let html = r#"
            <div class="entry-content"><script>only()</script></div>
            <p>This paragraph is long enough to count.</p>
        "#;
        let page = extractor().extract_page(html);
        assert_eq!(page.strategy, "first-container");
        assert!(page.content.is_empty());
    }

    #[test]
    fn next_link_by_text_then_by_class() {
        let html = r#"
            <a class="next_page" href="/by-class">›</a>
            <a href="https://example.com/ch-2/">Next Chapter</a>
        "#;
        assert_eq!(
            extractor().extract_page(html).next_href.as_deref(),
            Some("https://example.com/ch-2/")
        );

        let html = r#"<a href="/prev">Previous</a><a class="next_page" href="/by-class">›</a>"#;
        assert_eq!(extractor().next_link_in(html).as_deref(), Some("/by-class"));
    }

    #[test]
    fn next_link_text_match_is_case_sensitive_and_needs_href() {
        assert_eq!(extractor().next_link_in(r#"<a href="/x">next</a>"#), None);
        assert_eq!(extractor().next_link_in("<a>Next</a>"), None);
    }

    #[test]
    fn strategy_chain_is_ordered() {
        let names = extractor()
            .strategies()
            .iter()
            .map(ContentStrategy::name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "densest-container",
                "first-container",
                "first-container",
                "long-paragraphs"
            ]
        );
    }
}
