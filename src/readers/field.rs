use csv::StringRecord;

/// How a column's text is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    UnsignedInt,
    Float,
    Text,
}

/// One column of a fixed layout, consumed positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    Extract { name: &'static str, kind: FieldKind },
    Ignore,
}

/// A converted column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    UnsignedInt(u64),
    Float(f64),
    Text(String),
}

impl FieldKind {
    pub fn parse(&self, raw: &str) -> Result<FieldValue, String> {
        match self {
            FieldKind::UnsignedInt => raw
                .parse::<u64>()
                .map(FieldValue::UnsignedInt)
                .map_err(|_| format!("'{}' is not an unsigned integer", raw)),
            FieldKind::Float => raw
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| format!("'{}' is not a number", raw)),
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
        }
    }
}

impl FieldSpec {
    pub const fn extract(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec::Extract { name, kind }
    }
}

impl FieldValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UnsignedInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Convert a split line according to `specs`.
///
/// The line must have exactly one column per spec. Ignored columns are
/// consumed without conversion and the returned values follow the order of
/// the `Extract` specs.
pub fn parse_fields(specs: &[FieldSpec], record: &StringRecord) -> Result<Vec<FieldValue>, String> {
    if record.len() != specs.len() {
        return Err(format!(
            "expected {} fields, found {}",
            specs.len(),
            record.len()
        ));
    }

    let mut values = Vec::with_capacity(specs.len());
    for (index, (spec, raw)) in specs.iter().zip(record.iter()).enumerate() {
        if let FieldSpec::Extract { name, kind } = spec {
            let value = kind
                .parse(raw)
                .map_err(|e| format!("field {} ({}): {}", index + 1, name, e))?;
            values.push(value);
        }
    }

    Ok(values)
}
