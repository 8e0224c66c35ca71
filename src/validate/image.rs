//! Responsive image consistency checks
//!
//! An `<img>` with `src`/`srcset`/`sizes` promises the browser that its
//! candidates are the same picture at different resolutions. The checks here
//! measure every internal candidate and flag the element when the declared
//! descriptors do not match the files.

use crate::extract::html::{PageElements, TagInfo};
use crate::extract::srcset::{parse_srcset, Descriptor};
use crate::validate::context::ValidationContext;
use crate::validate::result::{ElementInPage, ImageCandidate, ValidationResult};
use crate::Result;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Allowed width error for density descriptors, in pixels
const DENSITY_TOLERANCE: f64 = 1.0;

/// Allowed height error when comparing aspect ratios, in pixels
const ASPECT_TOLERANCE: f64 = 2.0;

static PIXEL_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)px$").expect("pixel size regex"));

/// Checks every `<img>` of a page
///
/// An image with a candidate that is missing or cannot be measured is skipped;
/// the missing file is already reported by the link checks.
pub fn check_images(
    ctx: &ValidationContext,
    page_url: &str,
    page: &PageElements,
) -> Result<Vec<ValidationResult>> {
    let base = Url::parse(page_url)?;
    let mut results = Vec::new();

    for img in &page.imgs {
        if let Some(result) = check_image(ctx, &base, img)? {
            results.push(result);
        }
    }

    Ok(results)
}

fn check_image(ctx: &ValidationContext, page_url: &Url, img: &TagInfo) -> Result<Option<ValidationResult>> {
    let src_attr = img.attr("src").filter(|src| !src.is_empty());
    let srcset_attr = img
        .attr("srcset")
        .map(parse_srcset)
        .filter(|candidates| !candidates.is_empty());
    let sizes = img.attr("sizes").map(str::to_string);

    if src_attr.is_none() && srcset_attr.is_none() {
        return Ok(None);
    }

    let src = match src_attr {
        Some(src) => match measure(ctx, page_url, src, None)? {
            Some(candidate) => Some(candidate),
            None => return Ok(None),
        },
        None => None,
    };

    let srcset = match srcset_attr {
        Some(parsed) => {
            let mut candidates = Vec::with_capacity(parsed.len());
            for candidate in parsed {
                match measure(ctx, page_url, &candidate.url, candidate.descriptor)? {
                    Some(measured) => candidates.push(measured),
                    None => return Ok(None),
                }
            }
            Some(candidates)
        }
        None => None,
    };

    let candidates = srcset.as_deref().unwrap_or_default();
    if !is_inconsistent(src.as_ref(), candidates, sizes.as_deref()) {
        return Ok(None);
    }

    tracing::debug!("Inconsistent image on {}: {}", page_url, img.element.selector);
    Ok(Some(ValidationResult::ImgSrcInvalid {
        location: ElementInPage {
            url: page_url.to_string(),
            location: img.element.clone(),
        },
        src,
        srcset,
        sizes,
    }))
}

/// Resolves a candidate and reads the pixel size of internal ones
///
/// Returns `None` when an internal candidate cannot be measured.
fn measure(
    ctx: &ValidationContext,
    page_url: &Url,
    url: &str,
    descriptor: Option<Descriptor>,
) -> Result<Option<ImageCandidate>> {
    let Ok(resolved) = page_url.join(url) else {
        return Ok(None);
    };
    let url = resolved.to_string();

    if !ctx.is_internal(&url) {
        return Ok(Some(ImageCandidate {
            url,
            external: true,
            descriptor,
            width: None,
            height: None,
        }));
    }

    let Some(found) = ctx.entry(&url)?.found() else {
        return Ok(None);
    };

    match image::image_dimensions(&found.data.path) {
        Ok((width, height)) => Ok(Some(ImageCandidate {
            url,
            external: false,
            descriptor,
            width: Some(width),
            height: Some(height),
        })),
        Err(e) => {
            tracing::debug!("Cannot measure {}: {}", url, e);
            Ok(None)
        }
    }
}

fn dimensions(candidate: &ImageCandidate) -> Option<(f64, f64)> {
    if candidate.external {
        return None;
    }
    Some((f64::from(candidate.width?), f64::from(candidate.height?)))
}

/// Applies the width, density, aspect-ratio and sizes rules
fn is_inconsistent(src: Option<&ImageCandidate>, srcset: &[ImageCandidate], sizes: Option<&str>) -> bool {
    widths_incorrect(srcset)
        || densities_incorrect(src, srcset)
        || aspect_ratios_differ(src, srcset)
        || sizes_incorrect(srcset, sizes)
}

/// A `Nw` candidate must be exactly N pixels wide
fn widths_incorrect(srcset: &[ImageCandidate]) -> bool {
    srcset.iter().filter(|c| !c.external).any(|candidate| match candidate.descriptor {
        Some(Descriptor::Width(declared)) => candidate.width != Some(declared),
        _ => false,
    })
}

/// Density candidates, plus `src` at 1x, must scale from the densest one
fn densities_incorrect(src: Option<&ImageCandidate>, srcset: &[ImageCandidate]) -> bool {
    let mut sized: Vec<(f64, f64)> = srcset
        .iter()
        .filter_map(|candidate| {
            let density = match candidate.descriptor {
                Some(Descriptor::Density(density)) => density,
                None => 1.0,
                Some(Descriptor::Width(_)) => return None,
            };
            dimensions(candidate).map(|(width, _)| (density, width))
        })
        .collect();
    if let Some((width, _)) = src.and_then(dimensions) {
        sized.push((1.0, width));
    }

    let Some(&(max_density, reference_width)) = sized
        .iter()
        .fold(None, |best: Option<&(f64, f64)>, candidate| match best {
            Some(best) if best.0 >= candidate.0 => Some(best),
            _ => Some(candidate),
        })
    else {
        return false;
    };

    sized.iter().any(|&(density, width)| {
        (width - reference_width * density / max_density).abs() > DENSITY_TOLERANCE
    })
}

/// Every internal candidate must have the aspect ratio of the first one
fn aspect_ratios_differ(src: Option<&ImageCandidate>, srcset: &[ImageCandidate]) -> bool {
    let measured: Vec<(f64, f64)> = srcset
        .iter()
        .chain(src)
        .filter_map(dimensions)
        .filter(|(width, _)| *width > 0.0)
        .collect();

    let Some(&(first_width, first_height)) = measured.first() else {
        return false;
    };

    measured
        .iter()
        .any(|&(width, height)| (first_height - height * first_width / width).abs() > ASPECT_TOLERANCE)
}

/// A single `Npx` sizes value must match the width of some `w` candidate
fn sizes_incorrect(srcset: &[ImageCandidate], sizes: Option<&str>) -> bool {
    let Some(sizes) = sizes.map(str::trim) else {
        return false;
    };
    let width_described = srcset
        .iter()
        .any(|c| matches!(c.descriptor, Some(Descriptor::Width(_))));
    if !width_described || sizes.contains(char::is_whitespace) {
        return false;
    }
    let Some(pixels) = PIXEL_SIZE
        .captures(sizes)
        .and_then(|captures| captures[1].parse::<u32>().ok())
    else {
        return false;
    };

    !srcset.iter().any(|candidate| candidate.width == Some(pixels))
}
