//! Ingredient unit table for converting household measures to grams.
//!
//! Recipes are written with the measures home cooks use ("鶏むね肉 1枚", "にんじん 1/2本").
//! Nutrition calculations need grams, so every (ingredient, unit label) pair the editors use is
//! listed here once. The table is hand-authored and never changes at runtime.
//!
//! [`convert_to_grams`] falls back to `0.0` for unknown pairs, so a caller cannot tell "zero
//! grams" from "not in the table". Use [`lookup`] where the difference matters.

use std::collections::HashMap;
use std::sync::LazyLock;

/// One row of the table: `unit` of `name` weighs `grams`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientUnit {
    pub name: &'static str,
    pub unit: &'static str,
    pub grams: f64,
}

const fn unit(name: &'static str, unit: &'static str, grams: f64) -> IngredientUnit {
    IngredientUnit { name, unit, grams }
}

static INGREDIENT_UNITS: &[IngredientUnit] = &[
    // Meat
    unit("鶏むね肉", "1枚", 150.0),
    unit("鶏むね肉", "1/2枚", 75.0),
    unit("鶏もも肉", "1枚", 250.0),
    unit("鶏もも肉", "1/2枚", 125.0),
    unit("鶏ささみ", "1本", 50.0),
    unit("鶏レバー", "1個", 40.0),
    unit("鶏ひき肉", "1パック", 200.0),
    unit("豚ひき肉", "1パック", 200.0),
    unit("豚もも肉", "1枚", 30.0),
    unit("牛ひき肉", "1パック", 200.0),
    unit("牛もも肉", "1枚", 30.0),
    unit("馬肉", "1パック", 100.0),
    unit("ラム肉", "1枚", 40.0),
    // Fish & eggs
    unit("鮭", "1切れ", 80.0),
    unit("たら", "1切れ", 90.0),
    unit("さば", "1切れ", 80.0),
    unit("しらす", "大さじ1", 5.0),
    unit("かつお節", "1パック", 2.5),
    unit("卵", "1個", 50.0),
    unit("うずらの卵", "1個", 10.0),
    // Vegetables
    unit("にんじん", "1本", 150.0),
    unit("にんじん", "1/2本", 75.0),
    unit("にんじん", "1cm", 10.0),
    unit("かぼちゃ", "1/8個", 150.0),
    unit("かぼちゃ", "1切れ", 40.0),
    unit("じゃがいも", "1個", 130.0),
    unit("さつまいも", "1本", 250.0),
    unit("さつまいも", "1cm", 15.0),
    unit("キャベツ", "1枚", 50.0),
    unit("白菜", "1枚", 100.0),
    unit("ブロッコリー", "1房", 15.0),
    unit("ブロッコリー", "1株", 250.0),
    unit("小松菜", "1株", 40.0),
    unit("小松菜", "1束", 250.0),
    unit("ほうれん草", "1株", 30.0),
    unit("ほうれん草", "1束", 200.0),
    unit("大根", "1cm", 30.0),
    unit("大根", "1本", 1000.0),
    unit("きゅうり", "1本", 100.0),
    unit("トマト", "1個", 150.0),
    unit("ミニトマト", "1個", 15.0),
    unit("ピーマン", "1個", 35.0),
    unit("しめじ", "1パック", 100.0),
    unit("えのき", "1袋", 100.0),
    // Fruit
    unit("りんご", "1個", 300.0),
    unit("りんご", "1/8個", 35.0),
    unit("バナナ", "1本", 100.0),
    unit("ブルーベリー", "10粒", 10.0),
    // Grains & soy
    unit("ご飯", "1膳", 150.0),
    unit("ご飯", "大さじ1", 15.0),
    unit("オートミール", "大さじ1", 8.0),
    unit("豆腐", "1丁", 300.0),
    unit("豆腐", "1/2丁", 150.0),
    unit("納豆", "1パック", 45.0),
    unit("おから", "大さじ1", 6.0),
    // Dairy, oils, liquids
    unit("ヨーグルト", "大さじ1", 15.0),
    unit("カッテージチーズ", "大さじ1", 15.0),
    unit("オリーブオイル", "小さじ1", 4.0),
    unit("オリーブオイル", "大さじ1", 12.0),
    unit("ごま油", "小さじ1", 4.0),
    unit("すりごま", "小さじ1", 2.0),
    unit("水", "小さじ1", 5.0),
    unit("水", "大さじ1", 15.0),
    unit("水", "1カップ", 200.0),
];

/// ingredient -> unit label -> grams
static INDEX: LazyLock<HashMap<&'static str, HashMap<&'static str, f64>>> = LazyLock::new(|| {
    let mut index: HashMap<&'static str, HashMap<&'static str, f64>> = HashMap::new();
    for row in INGREDIENT_UNITS {
        index.entry(row.name).or_default().insert(row.unit, row.grams);
    }
    index
});

/// Grams for `unit` of `ingredient`, or `None` when the pair is not in the table.
pub fn lookup(ingredient: &str, unit: &str) -> Option<f64> {
    INDEX
        .get(ingredient.trim())
        .and_then(|units| units.get(unit.trim()))
        .copied()
}

/// Grams for `unit` of `ingredient`; `0.0` when either key is unknown.
pub fn convert_to_grams(ingredient: &str, unit: &str) -> f64 {
    lookup(ingredient, unit).unwrap_or(0.0)
}

/// Unit labels known for an ingredient, in table order.
pub fn units_for(ingredient: &str) -> Vec<&'static str> {
    let ingredient = ingredient.trim();
    INGREDIENT_UNITS
        .iter()
        .filter(|row| row.name == ingredient)
        .map(|row| row.unit)
        .collect()
}

/// Distinct ingredient names, in table order.
pub fn ingredient_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for row in INGREDIENT_UNITS {
        if !names.contains(&row.name) {
            names.push(row.name);
        }
    }
    names
}

/// The whole table.
pub fn all() -> &'static [IngredientUnit] {
    INGREDIENT_UNITS
}
