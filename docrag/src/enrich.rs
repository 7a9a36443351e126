//! Enrichment stage: merges image descriptions into page text and markdown.
//!
//! Pure data transformation, no I/O. Deterministic given identical inputs,
//! which the content-hash-based cache downstream relies on.

use std::collections::BTreeMap;

use docrag_core::{ExtractedImage, Page};

/// Separator line that opens a page's image-description block.
///
/// Doubles as the already-enriched marker: pages or markdown sections that
/// contain it are skipped, so enriching twice is a no-op.
pub const IMAGE_BLOCK_MARKER: &str = "**[IMAGES ON THIS PAGE]:**";

/// Markdown heading prefix for page sections (`## Page N`).
const PAGE_HEADING: &str = "## Page ";

/// Merge image descriptions into page text and into the full-document
/// markdown. Returns the enriched pages and markdown; pages without images
/// pass through unchanged.
///
/// Each page with images gets one appended block: a separator, the marker
/// line, then one entry per image (filename and description) in ascending
/// sequence order. The same block is inserted into the markdown at the end
/// of that page's `## Page N` section.
pub fn enrich(
    pages: Vec<Page>,
    markdown: String,
    described_images: &[ExtractedImage],
) -> (Vec<Page>, String) {
    let by_page = group_by_page(described_images);

    let enriched_pages = pages
        .into_iter()
        .map(|mut page| {
            if let Some(images) = by_page.get(&page.page_number) {
                if !page.text.contains(IMAGE_BLOCK_MARKER) {
                    page.text.push_str(&image_block(images));
                }
            }
            page
        })
        .collect();

    let enriched_markdown = enrich_markdown(markdown, &by_page);
    (enriched_pages, enriched_markdown)
}

/// Group images by page, ascending sequence index within each page.
/// `BTreeMap` keeps pages in ascending order for the callers that iterate.
fn group_by_page(images: &[ExtractedImage]) -> BTreeMap<u32, Vec<&ExtractedImage>> {
    let mut by_page: BTreeMap<u32, Vec<&ExtractedImage>> = BTreeMap::new();
    for image in images {
        by_page.entry(image.page_number).or_default().push(image);
    }
    for page_images in by_page.values_mut() {
        page_images.sort_by_key(|image| image.sequence_index);
    }
    by_page
}

/// Render the deterministic image-description block for one page.
fn image_block(images: &[&ExtractedImage]) -> String {
    let mut block = format!("\n\n---\n{IMAGE_BLOCK_MARKER}\n");
    for image in images {
        let description = image.description.as_deref().unwrap_or("No description");
        block.push_str(&format!("\n- **Image: {}**\n  {}\n", image.filename, description));
    }
    block
}

/// A `## Page N` section of the document markdown, located by byte offsets
/// against the original string.
struct PageSection {
    page_number: u32,
    /// Byte offset just past the section's content (the start of the next
    /// heading, or the end of the document for the last section).
    end: usize,
    /// Whether the section body already carries an image block.
    enriched: bool,
}

/// Scan the markdown into ordered page sections by `## Page N` headings.
fn scan_sections(markdown: &str) -> Vec<PageSection> {
    let mut sections: Vec<PageSection> = Vec::new();
    let mut offset = 0;

    for line in markdown.split_inclusive('\n') {
        if let Some(rest) = line.trim_end().strip_prefix(PAGE_HEADING) {
            if let Ok(page_number) = rest.trim().parse::<u32>() {
                if let Some(last) = sections.last_mut() {
                    last.end = offset;
                }
                sections.push(PageSection { page_number, end: markdown.len(), enriched: false });
            }
        }
        offset += line.len();
    }

    // Mark sections whose body already contains the marker.
    let mut start = 0;
    for section in &mut sections {
        section.enriched = markdown[start..section.end].contains(IMAGE_BLOCK_MARKER);
        start = section.end;
    }

    sections
}

/// Insert each page's image block at the end of its markdown section.
///
/// Insertions run from the highest page down to the lowest: offsets were
/// computed against the original string, and an insertion only shifts text
/// downstream of its own section.
fn enrich_markdown(mut markdown: String, by_page: &BTreeMap<u32, Vec<&ExtractedImage>>) -> String {
    let sections = scan_sections(&markdown);

    for section in sections.iter().rev() {
        if section.enriched {
            continue;
        }
        if let Some(images) = by_page.get(&section.page_number) {
            markdown.insert_str(section.end, &image_block(images));
        }
    }

    markdown
}
