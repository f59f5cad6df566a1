//! One decode pass: resolve, then fill the builder in a fixed order.

use crate::error::Result;
use crate::geometry::read_points;
use crate::layout::Layout;
use crate::options::LoadOptions;
use crate::properties::{Properties, PropertiesBuilder};
use crate::resolver::resolve;
use crate::store::TabularStore;
use crate::structure::read_sections;
use crate::substructure::{read_mitochondria, read_perimeters};

/// Decodes a morphology from any [`TabularStore`] with default options.
pub fn decode<S: TabularStore + ?Sized>(store: &S) -> Result<Properties> {
    decode_with_options(store, &LoadOptions::default())
}

pub fn decode_with_options<S: TabularStore + ?Sized>(
    store: &S,
    options: &LoadOptions,
) -> Result<Properties> {
    let file = store.location();
    let resolution = resolve(store, options)?;
    let layout = Layout::for_version(resolution.version, resolution.stage);
    let mut builder = PropertiesBuilder::new(&resolution);

    let (points, diameters) = read_points(store, &layout.points, resolution.stage)?;
    builder.point_level.points = points;
    builder.point_level.diameters = diameters;
    builder.section_level = read_sections(store, &layout.sections, resolution.stage)?;

    if layout.substructures {
        builder.point_level.perimeters = read_perimeters(store, resolution.family)?;
        let (mito_points, mito_sections) = read_mitochondria(store, resolution.family)?;
        builder.mito_point_level = mito_points;
        builder.mito_section_level = mito_sections;
    }

    let properties = builder.finish(file)?;
    tracing::debug!(
        file,
        version = %properties.version(),
        points = properties.points().len(),
        sections = properties.sections().len(),
        "decoded morphology"
    );
    Ok(properties)
}
