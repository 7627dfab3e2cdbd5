use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Title shown for markers reported without a name or description
pub const DEFAULT_TITLE: &str = "Unnamed pet";

/// Fixed marker palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerColor {
    #[default]
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl MarkerColor {
    pub fn as_hex(&self) -> &'static str {
        match self {
            MarkerColor::Red => "#E53E3E",
            MarkerColor::Blue => "#3182CE",
            MarkerColor::Green => "#38A169",
            MarkerColor::Yellow => "#D69E2E",
            MarkerColor::Purple => "#805AD5",
        }
    }

    /// Parse a hex value; anything outside the palette becomes the default
    pub fn from_hex(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "#3182CE" => MarkerColor::Blue,
            "#38A169" => MarkerColor::Green,
            "#D69E2E" => MarkerColor::Yellow,
            "#805AD5" => MarkerColor::Purple,
            _ => MarkerColor::Red,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            MarkerColor::Red => "Red",
            MarkerColor::Blue => "Blue",
            MarkerColor::Green => "Green",
            MarkerColor::Yellow => "Yellow",
            MarkerColor::Purple => "Purple",
        }
    }

    pub fn all() -> &'static [MarkerColor] {
        static ALL: [MarkerColor; 5] = [
            MarkerColor::Red,
            MarkerColor::Blue,
            MarkerColor::Green,
            MarkerColor::Yellow,
            MarkerColor::Purple,
        ];
        &ALL
    }
}

impl Serialize for MarkerColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_hex())
    }
}

impl<'de> Deserialize<'de> for MarkerColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Accept null and non-string values too, they all fall back
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(MarkerColor::from_hex).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Opaque marker identifier; numeric ids are kept in their decimal form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reported pet as shown on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetMarker {
    pub id: MarkerId,
    pub title: String,
    pub description: String,
    pub position: Position,
    pub color: MarkerColor,
    pub photo_url: Option<String>,
    /// Client-side flag; the service does not reliably fill it
    pub is_mine: bool,
}

/// Marker as sent by the service (`/api/animais`).
///
/// Fields are kept as raw JSON so that a badly typed cosmetic field never
/// costs the whole record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub nome: Value,
    #[serde(default)]
    pub descricao: Value,
    #[serde(default)]
    pub latitude: Value,
    #[serde(default)]
    pub longitude: Value,
    #[serde(default)]
    pub color: MarkerColor,
    #[serde(default)]
    pub foto_path: Value,
    #[serde(default)]
    pub image_url: Value,
    #[serde(default)]
    pub is_my_pet: Value,
}

impl AnimalRecord {
    /// Normalize into a [`PetMarker`].
    ///
    /// Returns `None` when the record has no usable id or coordinates.
    /// `base_url` resolves server-relative photo paths.
    pub fn into_marker(self, base_url: &str) -> Option<PetMarker> {
        let id = MarkerId::from_value(&self.id)?;
        let position = Position::new(
            coerce_coordinate(&self.latitude)?,
            coerce_coordinate(&self.longitude)?,
        );
        if !position.is_valid() {
            return None;
        }

        let name = text(&self.nome);
        let description = text(&self.descricao);
        let title = name
            .clone()
            .or_else(|| description.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let photo_url = text(&self.foto_path)
            .map(|path| resolve_photo_path(base_url, &path))
            .or_else(|| text(&self.image_url));

        Some(PetMarker {
            id,
            title,
            description: description.unwrap_or_default(),
            position,
            color: self.color,
            photo_url,
            is_mine: truthy(&self.is_my_pet),
        })
    }
}

/// Numeric coordinate from either a JSON number or a numeric string
pub fn coerce_coordinate(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn resolve_photo_path(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Trimmed non-empty string; other JSON types count as absent
fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://pets.example.com";

    fn record(value: Value) -> AnimalRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_string_coordinates_are_coerced() {
        let marker = record(json!({
            "id": 1,
            "descricao": "Rex",
            "latitude": "-23.5",
            "longitude": "-46.6",
            "color": null,
            "isMyPet": null
        }))
        .into_marker(BASE)
        .unwrap();

        assert_eq!(marker.id, MarkerId::new("1"));
        assert_eq!(marker.position, Position::new(-23.5, -46.6));
        assert_eq!(marker.color, MarkerColor::Red);
        assert!(!marker.is_mine);
        assert_eq!(marker.title, "Rex");
        assert_eq!(marker.description, "Rex");
    }

    #[test]
    fn test_name_wins_over_description_for_title() {
        let marker = record(json!({
            "id": "a1",
            "nome": "Mia",
            "descricao": "Grey cat, very shy",
            "latitude": 1.5,
            "longitude": 2.5,
            "color": "#3182ce",
            "isMyPet": true
        }))
        .into_marker(BASE)
        .unwrap();

        assert_eq!(marker.title, "Mia");
        assert_eq!(marker.description, "Grey cat, very shy");
        assert_eq!(marker.color, MarkerColor::Blue);
        assert!(marker.is_mine);
    }

    #[test]
    fn test_untitled_marker_gets_default_title() {
        let marker = record(json!({"id": 3, "latitude": 0, "longitude": 0}))
            .into_marker(BASE)
            .unwrap();
        assert_eq!(marker.title, DEFAULT_TITLE);
        assert_eq!(marker.description, "");
    }

    #[test]
    fn test_unknown_color_falls_back() {
        let marker = record(json!({"id": 3, "latitude": 0, "longitude": 0, "color": "#123456"}))
            .into_marker(BASE)
            .unwrap();
        assert_eq!(marker.color, MarkerColor::Red);
    }

    #[test]
    fn test_photo_paths() {
        let marker = record(json!({
            "id": 1, "latitude": 0, "longitude": 0, "fotoPath": "/uploads/rex.jpg"
        }))
        .into_marker(BASE)
        .unwrap();
        assert_eq!(
            marker.photo_url.as_deref(),
            Some("https://pets.example.com/uploads/rex.jpg")
        );

        let marker = record(json!({
            "id": 1, "latitude": 0, "longitude": 0, "imageUrl": "https://cdn.example.com/rex.jpg"
        }))
        .into_marker(BASE)
        .unwrap();
        assert_eq!(
            marker.photo_url.as_deref(),
            Some("https://cdn.example.com/rex.jpg")
        );
    }

    #[test]
    fn test_unusable_records_are_rejected() {
        assert!(record(json!({"id": 1, "latitude": "north", "longitude": 0}))
            .into_marker(BASE)
            .is_none());
        assert!(record(json!({"id": 1, "latitude": 95, "longitude": 0}))
            .into_marker(BASE)
            .is_none());
        assert!(record(json!({"latitude": 1, "longitude": 1}))
            .into_marker(BASE)
            .is_none());
    }

    #[test]
    fn test_badly_typed_fields_fall_back() {
        let marker = record(json!({
            "id": 1, "latitude": 1, "longitude": 1, "isMyPet": 0
        }))
        .into_marker(BASE)
        .unwrap();
        assert!(!marker.is_mine);

        let marker = record(json!({
            "id": 2, "nome": 123, "descricao": ["x"], "latitude": 1, "longitude": 1, "isMyPet": 1
        }))
        .into_marker(BASE)
        .unwrap();
        assert_eq!(marker.title, DEFAULT_TITLE);
        assert_eq!(marker.description, "");
        assert!(marker.is_mine);

        let marker = record(json!({
            "id": 3, "latitude": 1, "longitude": 1, "fotoPath": 42, "imageUrl": {"src": "x"}
        }))
        .into_marker(BASE)
        .unwrap();
        assert!(marker.photo_url.is_none());
        assert!(!marker.is_mine);
    }

    #[test]
    fn test_color_serializes_as_hex() {
        assert_eq!(serde_json::to_value(MarkerColor::Green).unwrap(), json!("#38A169"));
        for color in MarkerColor::all() {
            assert_eq!(MarkerColor::from_hex(color.as_hex()), *color);
        }
    }
}
