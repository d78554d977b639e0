//! Candidate filtering heuristics, category classification and display names.

use crate::models::{Candidate, Category, Tags};

/// Name fragments that mark a company, office or industrial site.
pub const CORPORATE_NAME_KEYWORDS: &[&str] = &[
    "technologies",
    "sdn bhd",
    "sdn. bhd.",
    "berhad",
    "bhd",
    "corporation",
    "corp",
    "inc",
    "ltd",
    "limited",
    "company",
    "factory",
    "manufacturing",
    "industrial",
    "headquarters",
    "office",
    "offices",
    "commercial",
    "business park",
];

/// Subset of corporate keywords that cost relevance points.
pub const COMPANY_INDICATORS: &[&str] = &[
    "technologies",
    "sdn bhd",
    "sdn. bhd.",
    "berhad",
    "bhd",
    "corporation",
    "corp",
    "inc",
    "ltd",
    "limited",
    "company",
    "factory",
    "manufacturing",
    "headquarters",
];

const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::OpenField,
        &["park", "field", "sports complex", "recreation", "stadium", "playground"],
    ),
    (Category::Beach, &["beach", "coast", "seaside", "shore", "pantai"]),
    (
        Category::HillMountain,
        &["hill", "mountain", "gunung", "peak", "viewpoint", "scenic"],
    ),
    (
        Category::ScenicTown,
        &["heritage", "town", "city", "historical", "cultural"],
    ),
];

const ROAD_WORDS: &[&str] = &[
    "jalan", "road", "street", "st", "ave", "avenue", "blvd", "boulevard",
];

/// True for offices, industrial sites and company premises.
pub fn is_inappropriate(tags: &Tags) -> bool {
    if tags.has("office") || tags.has("industrial") {
        return true;
    }
    if tags.is_any("landuse", &["industrial", "commercial"]) {
        return true;
    }
    if tags.is_any("amenity", &["office", "company"]) {
        return true;
    }
    let name = tags.name().unwrap_or_default().to_lowercase();
    CORPORATE_NAME_KEYWORDS
        .iter()
        .any(|keyword| name.contains(keyword))
}

/// Whether an unnamed element is still worth keeping.
pub fn qualifies_unnamed(tags: &Tags, low_coverage: bool) -> bool {
    if tags.is_any(
        "leisure",
        &[
            "park",
            "recreation_ground",
            "beach_resort",
            "sports_centre",
            "stadium",
            "pitch",
            "playground",
        ],
    ) || tags.is_any("natural", &["beach", "peak", "grassland", "meadow"])
        || tags.is_any("tourism", &["attraction", "viewpoint"])
        || tags.is_any("landuse", &["meadow", "grass", "recreation_ground"])
        || tags.has("historic")
    {
        return true;
    }

    low_coverage
        && (tags.has("leisure")
            || tags.has("natural")
            || tags.has("tourism")
            || tags.is_any(
                "landuse",
                &["meadow", "grass", "recreation_ground", "forest", "farmland"],
            ))
}

/// Assign a spot category from name keywords, then tags.
pub fn classify(candidate: &Candidate) -> Category {
    let tags = &candidate.tags;
    if is_inappropriate(tags) {
        return Category::OpenField;
    }

    let name = tags.get("name").unwrap_or_default().to_lowercase();
    let values: Vec<String> = tags.values().map(str::to_lowercase).collect();
    for (category, keywords) in CATEGORY_KEYWORDS {
        let hit = keywords.iter().any(|keyword| {
            name.contains(keyword) || values.iter().any(|value| value.contains(keyword))
        });
        if hit {
            return *category;
        }
    }

    if tags.is_any("leisure", &["park", "recreation_ground"]) {
        return Category::OpenField;
    }
    if tags.is("natural", "beach") {
        return Category::Beach;
    }
    if tags.is("natural", "peak") {
        return Category::HillMountain;
    }
    if tags.is_any(
        "tourism",
        &["attraction", "viewpoint", "museum", "gallery", "monument", "memorial"],
    ) {
        return Category::ScenicTown;
    }

    Category::OpenField
}

/// Best human-readable name for a spot.
pub fn display_name(tags: &Tags, address: Option<&str>, category: Option<Category>) -> String {
    if let Some(name) = tags.name() {
        return name.to_string();
    }

    if let Some(address) = address {
        if let Some(part) = meaningful_address_part(address) {
            return part;
        }
    }

    let parts = tag_label_parts(tags);
    if !parts.is_empty() {
        return parts.join(" ");
    }

    if let Some(category) = category {
        return category.fallback_label().to_string();
    }

    if let Some(first) = address
        .and_then(|a| a.split(',').next())
        .map(str::trim)
        .filter(|first| first.len() > 3)
    {
        return first.to_string();
    }

    "Unnamed Location".to_string()
}

fn meaningful_address_part(address: &str) -> Option<String> {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    let usable = parts.len().saturating_sub(2);
    parts[..usable]
        .iter()
        .find(|part| {
            let lower = part.to_lowercase();
            lower != "malaysia"
                && part.len() > 3
                && !ROAD_WORDS.iter().any(|road| lower.contains(road))
        })
        .map(|part| {
            part.split_whitespace()
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" ")
        })
}

fn tag_label_parts(tags: &Tags) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(leisure) = tags.non_empty("leisure") {
        parts.push(match leisure {
            "park" => "Park".to_string(),
            "recreation_ground" => "Recreation Ground".to_string(),
            "sports_centre" => "Sports Centre".to_string(),
            "stadium" => "Stadium".to_string(),
            "pitch" => "Sports Pitch".to_string(),
            "playground" => "Playground".to_string(),
            other => title_case(other),
        });
    }
    if let Some(natural) = tags.non_empty("natural") {
        parts.push(match natural {
            "beach" => "Beach".to_string(),
            "peak" => "Peak".to_string(),
            "ridge" => "Ridge".to_string(),
            "volcano" => "Volcano".to_string(),
            other => title_case(other),
        });
    }
    if let Some(tourism) = tags.non_empty("tourism") {
        parts.push(match tourism {
            "attraction" => "Attraction".to_string(),
            "viewpoint" => "Viewpoint".to_string(),
            "museum" => "Museum".to_string(),
            "gallery" => "Gallery".to_string(),
            other => title_case(other),
        });
    }
    if tags.is("amenity", "parking") {
        parts.push("Parking Area".to_string());
    }
    match tags.get("landuse") {
        Some("meadow") => parts.push("Meadow".to_string()),
        Some("grass") => parts.push("Grassland".to_string()),
        Some("recreation_ground") => parts.push("Recreation Area".to_string()),
        _ => {}
    }
    parts
}

fn title_case(raw: &str) -> String {
    raw.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
