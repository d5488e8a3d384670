//! Detail-page extraction.
//!
//! A detail page carries one recipe inside a
//! `div[itemtype="http://data-vocabulary.org/Recipe"]` block. Most fields sit
//! at fixed structural locations; a few need text surgery:
//!
//! - the summary paragraph holds the comment followed by an optional
//!   `【準備時間：15分】` marker
//! - cook time, calories, genre and difficulty are `label：value` list items
//! - the yield span starts with `(4人分`
//! - ingredients are a `<dl>` of `dt`/`dd` pairs, where `dt.only_dt` rows have
//!   no `dd` of their own
//!
//! Any missing element aborts the record with
//! [`HarvestError::StructuralMismatch`].

use super::text_of;
use crate::config::{HarvestConfig, compile_pattern};
use crate::error::{HarvestError, Result};
use crate::models::{Ingredient, Recipe};
use crate::normalize::NameNormalizer;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

const OPEN_PAREN: char = '（';
const CLOSE_PAREN: char = '）';

static RECIPE_ROOT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[itemtype="http://data-vocabulary.org/Recipe"]"#)
        .expect("valid recipe root selector")
});
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"h2[itemprop="name"]"#).expect("valid title selector"));
static PHOTO: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#recipe_photo img").expect("valid photo selector"));
static SUMMARY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"p[itemprop="summary"]"#).expect("valid summary selector"));
static COOK_TIME: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div#recipe_content ul li.r_time time").expect("valid cook time selector")
});
static CALORIE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#recipe_content ul li.cal").expect("valid calorie selector"));
static GENRE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#recipe_content ul li.genre").expect("valid genre selector"));
static LEVEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#recipe_content ul li.level").expect("valid level selector"));
static STEPS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#recipe_howto ul li").expect("valid steps selector"));
static YIELD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[itemprop="ingredient"] span[itemprop="yield"]"#)
        .expect("valid yield selector")
});
static INGREDIENT_LIST: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[itemprop="ingredient"] dl"#).expect("valid ingredient list selector")
});
static TERM_OR_DEF: Lazy<Selector> =
    Lazy::new(|| Selector::parse("dt, dd").expect("valid dt/dd selector"));

/// Turns detail documents into [`Recipe`] records.
///
/// Built once per run from the configuration; holds the compiled patterns and
/// the name normalizer.
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    base: Url,
    field_separator: char,
    comment_terminator: char,
    marking_marker: char,
    prep_duration: Regex,
    yield_count: Regex,
    normalizer: NameNormalizer,
}

impl DetailExtractor {
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        let extract = &config.extract;
        Ok(Self {
            base: config.site.base()?,
            field_separator: extract.field_separator,
            comment_terminator: extract.comment_terminator,
            marking_marker: extract.marking_marker,
            prep_duration: compile_pattern(
                "extract.prep_duration_pattern",
                &extract.prep_duration_pattern,
            )?,
            yield_count: compile_pattern("extract.yield_pattern", &extract.yield_pattern)?,
            normalizer: NameNormalizer::new(&config.normalizer),
        })
    }

    /// Extract the recipe identified by `id` from its detail page.
    #[instrument(level = "debug", skip(self, document))]
    pub fn extract(&self, document: &Html, id: u32) -> Result<Recipe> {
        let root = document
            .select(&RECIPE_ROOT)
            .next()
            .ok_or_else(|| HarvestError::missing("recipe root div"))?;

        let title = text_of(select_one(root, &TITLE, "h2[itemprop=name]")?)
            .trim()
            .to_string();
        let img_url = self.image_url(root)?;

        let summary = text_of(select_one(root, &SUMMARY, "p[itemprop=summary]")?);
        let prep_duration = match self.prep_duration.captures(&summary) {
            Some(caps) => Some(parse_number("prep_duration", &caps[1])?),
            None => None,
        };
        let comment = summary
            .split(self.comment_terminator)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let cook_text = text_of(select_one(root, &COOK_TIME, "li.r_time time")?);
        let cook_duration = parse_number("cook_duration", strip_unit(&cook_text))?;
        let calorie_text = self.labeled(root, &CALORIE, "li.cal")?;
        let calorie = parse_number("calorie", strip_unit(&calorie_text))?;
        let genre = self.labeled(root, &GENRE, "li.genre")?;
        let difficulty = self.labeled(root, &LEVEL, "li.level")?;

        let instructions = root
            .select(&STEPS)
            .map(|step| text_of(step).trim().to_string())
            .collect();

        let yield_text = text_of(select_one(root, &YIELD, "span[itemprop=yield]")?);
        let yield_count = match self.yield_count.captures(yield_text.trim()) {
            Some(caps) => Some(parse_number("yield", &caps[1])?),
            None => None,
        };

        let ingredients = self.ingredients(root)?;
        debug!(
            title = %title,
            ingredients = ingredients.len(),
            "Extracted recipe"
        );

        Ok(Recipe {
            id,
            title,
            cook_duration,
            prep_duration,
            img_url,
            comment,
            calorie,
            genre,
            difficulty,
            instructions,
            yield_count,
            ingredients,
        })
    }

    fn image_url(&self, root: ElementRef<'_>) -> Result<String> {
        let src = select_one(root, &PHOTO, "div#recipe_photo img")?
            .value()
            .attr("src")
            .ok_or_else(|| HarvestError::missing("src on recipe photo"))?;
        let resolved = self.base.join(src).map_err(|source| HarvestError::InvalidUrl {
            url: src.to_string(),
            source,
        })?;
        Ok(resolved.to_string())
    }

    /// Value of a `label：value` list item.
    fn labeled(&self, root: ElementRef<'_>, sel: &Selector, what: &str) -> Result<String> {
        let text = text_of(select_one(root, sel, what)?);
        Ok(text
            .rsplit(self.field_separator)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn ingredients(&self, root: ElementRef<'_>) -> Result<Vec<Ingredient>> {
        let list = select_one(root, &INGREDIENT_LIST, "div[itemprop=ingredient] dl")?;

        let mut names = Vec::new();
        let mut amounts = Vec::new();
        for node in list.select(&TERM_OR_DEF) {
            let text = text_of(node);
            match node.value().name() {
                "dt" if node.value().classes().any(|c| c == "only_dt") => {
                    let text = self.normalizer.normalize_brackets(&text);
                    let (name, amount) = split_inline_amount(&text);
                    names.push(name);
                    amounts.push(amount);
                }
                "dt" => names.push(text),
                _ => amounts.push(text),
            }
        }
        if names.len() != amounts.len() {
            return Err(HarvestError::missing(format!(
                "ingredient amounts ({} names, {} amounts)",
                names.len(),
                amounts.len()
            )));
        }

        let mut ingredients = Vec::with_capacity(names.len());
        for (name, amount) in names.iter().zip(amounts.iter()) {
            match self.ingredient(name, amount)? {
                Some(ingredient) => ingredients.push(ingredient),
                None => warn!(amount = %amount.trim(), "Dropping ingredient with empty name"),
            }
        }
        Ok(ingredients)
    }

    fn ingredient(&self, raw_name: &str, raw_amount: &str) -> Result<Option<Ingredient>> {
        let amount = raw_amount.trim();
        let amount = (!amount.is_empty()).then(|| amount.to_string());

        let (base, marking) = self.split_marking(raw_name.trim());
        let normalized = self.normalizer.normalize(base);
        let (name, detail) = split_detail(normalized.trim())?;
        if name.is_empty() {
            return Ok(None);
        }

        Ok(Some(Ingredient {
            name,
            amount,
            detail,
            marking,
        }))
    }

    /// `しょうゆ -A` becomes (`しょうゆ`, `A`). The marker only counts when an
    /// uppercase character follows it directly.
    fn split_marking<'a>(&self, name: &'a str) -> (&'a str, Option<String>) {
        if let Some((base, mark)) = name.split_once(self.marking_marker) {
            if mark.chars().next().is_some_and(char::is_uppercase) {
                return (base.trim(), Some(mark.trim().to_string()));
            }
        }
        (name, None)
    }
}

/// Split a name holding exactly one parenthetical into name and detail.
///
/// A group that never closes, or one followed by more text, is an error.
fn split_detail(name: &str) -> Result<(String, Option<String>)> {
    if name.matches(OPEN_PAREN).count() != 1 {
        return Ok((name.to_string(), None));
    }
    let Some((base, rest)) = name.split_once(OPEN_PAREN) else {
        return Ok((name.to_string(), None));
    };
    let (detail, tail) = rest
        .split_once(CLOSE_PAREN)
        .ok_or_else(|| HarvestError::UnbalancedParenthesis {
            name: name.to_string(),
        })?;
    if !tail.trim().is_empty() {
        return Err(HarvestError::TextAfterParenthetical {
            name: name.to_string(),
        });
    }
    Ok((base.trim().to_string(), Some(detail.trim().to_string())))
}

/// `dt.only_dt` rows sometimes inline the amount after the closing
/// parenthesis, e.g. `卵（M）1個`. Brackets must already be full-width.
fn split_inline_amount(text: &str) -> (String, String) {
    match text.rsplit_once(CLOSE_PAREN) {
        Some((name, amount)) => (format!("{name}{CLOSE_PAREN}"), amount.to_string()),
        None => (text.to_string(), String::new()),
    }
}

/// Drop a trailing unit such as `分` or `kcal`.
fn strip_unit(text: &str) -> &str {
    text.trim().trim_end_matches(|c: char| !c.is_ascii_digit())
}

fn parse_number(field: &'static str, text: &str) -> Result<u32> {
    text.trim().parse().map_err(|_| HarvestError::Parse {
        field,
        text: text.to_string(),
    })
}

fn select_one<'a>(root: ElementRef<'a>, sel: &Selector, what: &str) -> Result<ElementRef<'a>> {
    root.select(sel)
        .next()
        .ok_or_else(|| HarvestError::missing(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY_TEXT: &str = "根菜をたっぷりとれるヘルシーおかず。\n\n【準備時間：15分】";

    fn page(summary: &str, yield_text: &str, ingredients: &str) -> String {
        format!(
            r#"<html><body>
<div itemscope itemtype="http://data-vocabulary.org/Recipe">
  <h2 itemprop="name">根菜の煮物</h2>
  <div id="recipe_photo"><img src="/images/recipe/1469.jpg" alt=""></div>
  <p itemprop="summary">{summary}</p>
  <div id="recipe_content">
    <ul>
      <li class="r_time">調理時間：<time itemprop="cookTime">30分</time></li>
      <li class="cal">カロリー：350kcal</li>
      <li class="genre">ジャンル：和風</li>
      <li class="level">難易度：普通</li>
    </ul>
  </div>
  <div itemprop="ingredient">
    <span itemprop="yield">{yield_text}</span>
    <dl>{ingredients}</dl>
  </div>
  <div id="recipe_howto">
    <ul>
      <li> 野菜を切る。 </li>
      <li>鍋に入れて加熱する。</li>
    </ul>
  </div>
</div>
</body></html>"#
        )
    }

    const INGREDIENTS: &str = r#"
      <dt>豚バラブロック肉</dt><dd>200g</dd>
      <dt>しょうゆ(減塩)</dt><dd>大さじ2</dd>
      <dt>砂糖 -A</dt><dd>小さじ1</dd>
      <dt class="only_dt">塩</dt>
      <dt class="only_dt">卵（M）1個</dt>
      <dt>水</dt><dd> </dd>"#;

    fn extractor() -> DetailExtractor {
        DetailExtractor::new(&HarvestConfig::embedded().unwrap()).unwrap()
    }

    fn extract(html: &str) -> Result<Recipe> {
        extractor().extract(&Html::parse_document(html), 1469)
    }

    #[test]
    fn test_extract_full_record() {
        let recipe = extract(&page(SUMMARY_TEXT, "(4人分)", INGREDIENTS)).unwrap();
        assert_eq!(recipe.id, 1469);
        assert_eq!(recipe.title, "根菜の煮物");
        assert_eq!(
            recipe.img_url,
            "http://www.club.t-fal.co.jp/images/recipe/1469.jpg"
        );
        assert_eq!(recipe.comment, "根菜をたっぷりとれるヘルシーおかず。");
        assert_eq!(recipe.prep_duration, Some(15));
        assert_eq!(recipe.cook_duration, 30);
        assert_eq!(recipe.calorie, 350);
        assert_eq!(recipe.genre, "和風");
        assert_eq!(recipe.difficulty, "普通");
        assert_eq!(recipe.yield_count, Some(4));
        assert_eq!(
            recipe.instructions,
            vec!["野菜を切る。", "鍋に入れて加熱する。"]
        );
    }

    #[test]
    fn test_extract_ingredients() {
        let recipe = extract(&page(SUMMARY_TEXT, "(4人分)", INGREDIENTS)).unwrap();
        let expected = vec![
            Ingredient {
                name: "豚バラブロック".into(),
                amount: Some("200g".into()),
                ..Default::default()
            },
            Ingredient {
                name: "しょうゆ".into(),
                amount: Some("大さじ2".into()),
                detail: Some("減塩".into()),
                ..Default::default()
            },
            Ingredient {
                name: "砂糖".into(),
                amount: Some("小さじ1".into()),
                marking: Some("A".into()),
                ..Default::default()
            },
            Ingredient {
                name: "塩".into(),
                ..Default::default()
            },
            Ingredient {
                name: "卵".into(),
                amount: Some("1個".into()),
                detail: Some("M".into()),
                ..Default::default()
            },
            Ingredient {
                name: "水".into(),
                ..Default::default()
            },
        ];
        assert_eq!(recipe.ingredients, expected);
        assert!(
            recipe
                .ingredients
                .iter()
                .all(|i| i.amount.as_deref() != Some(""))
        );
    }

    #[test]
    fn test_missing_prep_marker_leaves_duration_undefined() {
        let recipe = extract(&page("さっと作れる一品。", "(2人分)", INGREDIENTS)).unwrap();
        assert_eq!(recipe.prep_duration, None);
        assert_eq!(recipe.comment, "さっと作れる一品。");
    }

    #[test]
    fn test_comment_stops_at_any_bracket() {
        let recipe = extract(&page("おかず。【ポイント】冷めてもおいしい", "(2人分)", INGREDIENTS))
            .unwrap();
        assert_eq!(recipe.prep_duration, None);
        assert_eq!(recipe.comment, "おかず。");
    }

    #[test]
    fn test_unmatched_yield_is_undefined() {
        let recipe = extract(&page(SUMMARY_TEXT, "作りやすい分量", INGREDIENTS)).unwrap();
        assert_eq!(recipe.yield_count, None);
    }

    #[test]
    fn test_full_width_yield_paren() {
        let recipe = extract(&page(SUMMARY_TEXT, "（2人分）", INGREDIENTS)).unwrap();
        assert_eq!(recipe.yield_count, Some(2));
    }

    #[test]
    fn test_missing_root_is_mismatch() {
        let err = extract("<html><body><p>gone</p></body></html>").unwrap_err();
        assert!(matches!(err, HarvestError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_missing_calorie_is_mismatch() {
        let html = page(SUMMARY_TEXT, "(4人分)", INGREDIENTS)
            .replace(r#"<li class="cal">カロリー：350kcal</li>"#, "");
        let err = extract(&html).unwrap_err();
        assert!(matches!(err, HarvestError::StructuralMismatch { what } if what == "li.cal"));
    }

    #[test]
    fn test_bad_cook_time_is_parse_error() {
        let html = page(SUMMARY_TEXT, "(4人分)", INGREDIENTS).replace("30分", "約半時間");
        let err = extract(&html).unwrap_err();
        assert!(matches!(err, HarvestError::Parse { field: "cook_duration", .. }));
    }

    #[test]
    fn test_unclosed_parenthesis_is_error() {
        let html = page(SUMMARY_TEXT, "(4人分)", "<dt>しょうゆ（減塩</dt><dd>少々</dd>");
        let err = extract(&html).unwrap_err();
        assert!(matches!(
            err,
            HarvestError::UnbalancedParenthesis { name } if name == "しょうゆ（減塩"
        ));
    }

    #[test]
    fn test_unpaired_amounts_are_mismatch() {
        let html = page(SUMMARY_TEXT, "(4人分)", "<dt>塩</dt><dt>こしょう</dt><dd>少々</dd>");
        let err = extract(&html).unwrap_err();
        assert!(matches!(err, HarvestError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_text_after_parenthetical_is_error() {
        let html = page(SUMMARY_TEXT, "(4人分)", "<dt>塩（ひとつまみ）少々</dt><dd>適量</dd>");
        let err = extract(&html).unwrap_err();
        assert!(matches!(
            err,
            HarvestError::TextAfterParenthetical { name } if name == "塩（ひとつまみ）少々"
        ));
    }

    #[test]
    fn test_half_width_only_dt_row_keeps_amount() {
        let html = page(SUMMARY_TEXT, "(4人分)", r#"<dt class="only_dt">卵(M)1個</dt>"#);
        let recipe = extract(&html).unwrap();
        assert_eq!(
            recipe.ingredients,
            vec![Ingredient {
                name: "卵".into(),
                amount: Some("1個".into()),
                detail: Some("M".into()),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn test_split_detail() {
        assert_eq!(
            split_detail("しょうゆ（減塩）").unwrap(),
            ("しょうゆ".to_string(), Some("減塩".to_string()))
        );
        assert_eq!(
            split_detail("卵（M・溶く）").unwrap(),
            ("卵".to_string(), Some("M・溶く".to_string()))
        );
        assert_eq!(
            split_detail("ごま油（大）（小）").unwrap(),
            ("ごま油（大）（小）".to_string(), None)
        );
        assert!(matches!(
            split_detail("パン粉（乾燥）適量"),
            Err(HarvestError::TextAfterParenthetical { name }) if name == "パン粉（乾燥）適量"
        ));
        assert_eq!(split_detail("塩").unwrap(), ("塩".to_string(), None));
    }

    #[test]
    fn test_split_marking_requires_uppercase() {
        let ex = extractor();
        assert_eq!(ex.split_marking("みりん -B"), ("みりん", Some("B".to_string())));
        assert_eq!(ex.split_marking("ミニ-トマト"), ("ミニ-トマト", None));
        assert_eq!(ex.split_marking("だし-"), ("だし-", None));
    }

    #[test]
    fn test_split_inline_amount() {
        assert_eq!(
            split_inline_amount("卵（M）1個"),
            ("卵（M）".to_string(), "1個".to_string())
        );
        assert_eq!(split_inline_amount("塩"), ("塩".to_string(), String::new()));
    }

    #[test]
    fn test_strip_unit() {
        assert_eq!(strip_unit("30分"), "30");
        assert_eq!(strip_unit(" 350kcal "), "350");
        assert_eq!(strip_unit("分"), "");
    }
}
