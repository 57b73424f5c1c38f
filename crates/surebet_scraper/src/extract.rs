//! Surebet DOM extractor
//!
//! Struktura stránky se surebety:
//! <tbody class="surebet_record">
//!   <tr> <td class="profit-box"><span class="profit">2.1%</span><span class="age">3 min</span></td>
//!        <td class="booker"><a>Pinnacle</a><span class="minor">Tennis</span></td>
//!        <td class="time"><abbr title="16/10 18:30">18:30</abbr></td>
//!        <td class="event"><a>A – B</a></td>
//!        <td class="coeff"><abbr>H1(-1.5)</abbr></td>
//!        <td class="value"><a class="value_link">2.10</a></td> </tr>
//!   ...
//! </tbody>

use anyhow::{anyhow, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::model::{BookmakerRow, GeneralInfo, SurebetGroup, SurebetMap};

const BLOCK_SELECTOR: &str = "tbody.surebet_record, tr.surebet_record, .surebets-list tbody";
const HIDDEN_ROW_CLASS: &str = "hidden-record";

const BOOKER_CELL: &[&str] = &["td.booker", ".booker"];
const PROFIT: &[&str] = &["td.profit-box span.profit", ".profit"];
const AGE: &[&str] = &["td.profit-box span.age", ".age"];
const SPORT: &[&str] = &["span.minor", ".sport"];
const TIME: &[&str] = &["td.time abbr", "td.time", ".time"];
const EVENT: &[&str] = &["td.event a", ".event"];
const COEFF: &[&str] = &["td.coeff abbr", "td.coeff", ".coeff"];
const VALUE: &[&str] = &["td.value a.value_link", "td.value", ".value"];

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e}"))
}

/// Ordered selector candidates; the first one matching an element wins.
#[derive(Debug)]
struct Chain(Vec<Selector>);

impl Chain {
    fn parse(candidates: &[&str]) -> Result<Self> {
        candidates
            .iter()
            .map(|css| parse_selector(css))
            .collect::<Result<Vec<_>>>()
            .map(Chain)
    }

    fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.0.iter().find_map(|sel| scope.select(sel).next())
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn is_hidden(row: ElementRef<'_>) -> bool {
    row.value().classes().any(|c| c == HIDDEN_ROW_CLASS)
}

fn strip_markers(text: &str) -> String {
    text.replace(['●', '○'], "")
}

pub struct Extractor {
    block: Selector,
    row: Selector,
    link: Selector,
    booker_cell: Chain,
    profit: Chain,
    age: Chain,
    sport: Chain,
    time: Chain,
    event: Chain,
    coeff: Chain,
    value: Chain,
    parenthetical: Regex,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            block: parse_selector(BLOCK_SELECTOR)?,
            row: parse_selector("tr")?,
            link: parse_selector("a")?,
            booker_cell: Chain::parse(BOOKER_CELL)?,
            profit: Chain::parse(PROFIT)?,
            age: Chain::parse(AGE)?,
            sport: Chain::parse(SPORT)?,
            time: Chain::parse(TIME)?,
            event: Chain::parse(EVENT)?,
            coeff: Chain::parse(COEFF)?,
            value: Chain::parse(VALUE)?,
            parenthetical: Regex::new(r"\([^)]*\)")?,
        })
    }

    /// Extrahuje všechny surebet bloky ze serializovaného DOM.
    pub fn extract(&self, html: &str) -> SurebetMap {
        let document = Html::parse_document(html);
        let mut out = SurebetMap::new();

        for (index, block) in document.select(&self.block).enumerate() {
            let rows: Vec<ElementRef<'_>> = block
                .select(&self.row)
                .filter(|tr| !is_hidden(*tr) && self.booker_cell.first(*tr).is_some())
                .collect();

            let Some(first) = rows.first().copied() else {
                continue;
            };

            let general_info = GeneralInfo {
                profit: self.profit.first(first).map(text_of),
                age: self.age.first(first).map(text_of),
            };

            let bookmakers: Vec<BookmakerRow> = rows
                .iter()
                .filter_map(|tr| self.row_record(*tr))
                .filter(BookmakerRow::is_identifiable)
                .collect();

            if bookmakers.is_empty() {
                continue;
            }

            out.insert(
                format!("surebet_p{}", index + 1),
                SurebetGroup { general_info, bookmakers },
            );
        }

        out
    }

    fn row_record(&self, tr: ElementRef<'_>) -> Option<BookmakerRow> {
        let cell = self.booker_cell.first(tr)?;
        let booker = cell.select(&self.link).next().unwrap_or(cell);

        let datetime = self.time.first(tr).map(|el| {
            el.value()
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| text_of(el))
        });

        Some(BookmakerRow {
            bookmaker: Some(self.bookmaker_name(&text_of(booker))),
            sport: self.sport.first(cell).map(|el| strip_markers(&text_of(el)).trim().to_string()),
            datetime,
            event: self.event.first(tr).map(text_of),
            type_pari: self.coeff.first(tr).map(text_of),
            cote: self.value.first(tr).map(text_of),
        })
    }

    /// "● Pinnacle (FR)" → "Pinnacle"
    pub fn bookmaker_name(&self, raw: &str) -> String {
        let cleaned = strip_markers(raw);
        self.parenthetical.replace_all(&cleaned, "").trim().to_string()
    }
}
