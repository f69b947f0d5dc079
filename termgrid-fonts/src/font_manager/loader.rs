//! fontdb queries returning owned [`FontData`].

use fontdb::{Database, Family, Query, Stretch, Style, Weight};

use super::types::FontData;

/// Load the regular face of `family_name`.
pub(super) fn load_font_from_db(db: &Database, family_name: &str) -> Option<FontData> {
    load_font_from_db_with_style(db, family_name, None, None)
}

/// Load a face of `family_name` with the requested weight and style.
pub(super) fn load_font_from_db_with_style(
    db: &Database,
    family_name: &str,
    weight: Option<Weight>,
    style: Option<Style>,
) -> Option<FontData> {
    load_family(db, Family::Name(family_name), weight, style)
}

/// Load whatever face fontdb considers the generic monospace family.
pub(super) fn load_generic_monospace(db: &Database) -> Option<FontData> {
    load_family(db, Family::Monospace, None, None)
}

fn load_family(
    db: &Database,
    family: Family<'_>,
    weight: Option<Weight>,
    style: Option<Style>,
) -> Option<FontData> {
    let families = [family];
    let query = Query {
        families: &families,
        weight: weight.unwrap_or(Weight::NORMAL),
        stretch: Stretch::Normal,
        style: style.unwrap_or(Style::Normal),
    };

    let id = db.query(&query)?;
    db.with_face_data(id, |data, face_index| {
        FontData::new_with_index(data.to_vec(), face_index as usize)
    })
    .flatten()
}
