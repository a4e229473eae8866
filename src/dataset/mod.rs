//! # Dataset Store
//! src/dataset/mod.rs
//!
//! Estructura de consulta inmutable: región → pregunta → estratificación →
//! lista de muestras. Se construye una sola vez antes de arrancar el pool y
//! luego se comparte como `Arc<Dataset>`; los workers la leen sin locks.
//!
//! Las regiones y los estratos conservan el orden de primera aparición en el
//! archivo fuente. Las claves de estratificación se guardan codificadas como
//! texto de tupla (`('Sex', 'Male')`) y se decodifican al extraer.

pub mod loader;

use std::collections::HashMap;

/// Preguntas donde un valor menor es mejor (el resto: mayor es mejor)
const BEST_IS_MIN: [&str; 5] = [
    "Percent of adults aged 18 years and older who have an overweight classification",
    "Percent of adults aged 18 years and older who have obesity",
    "Percent of adults who engage in no leisure-time physical activity",
    "Percent of adults who report consuming fruit less than one time daily",
    "Percent of adults who report consuming vegetables less than one time daily",
];

/// Polaridad de una pregunta: decide qué extremo es "best" y cuál "worst"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    LowerIsBetter,
    HigherIsBetter,
}

impl Polarity {
    pub fn of(question: &str) -> Self {
        if BEST_IS_MIN.contains(&question) {
            Polarity::LowerIsBetter
        } else {
            Polarity::HigherIsBetter
        }
    }
}

/// Clave de estratificación: (categoría, valor)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StratKey {
    pub category: String,
    pub value: String,
}

impl StratKey {
    pub fn new(category: &str, value: &str) -> Self {
        Self {
            category: category.to_string(),
            value: value.to_string(),
        }
    }

    /// Codifica como `('category', 'value')`
    pub fn encode(&self) -> String {
        encode_tuple(&[&self.category, &self.value])
    }

    /// Inverso de `encode`. `None` si el texto no es una tupla de dos strings.
    pub fn decode(text: &str) -> Option<Self> {
        let mut items = decode_tuple(text)?;
        if items.len() != 2 {
            return None;
        }
        let value = items.pop()?;
        let category = items.pop()?;
        Some(Self { category, value })
    }
}

/// Renderiza strings como una tupla literal: `('a', 'b')`
pub fn encode_tuple(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("({})", quoted.join(", "))
}

fn quote(s: &str) -> String {
    // Comillas dobles sólo si el texto tiene simples y no dobles
    if s.contains('\'') && !s.contains('"') {
        return format!("\"{}\"", s.replace('\\', "\\\\"));
    }
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Parsea una tupla literal de strings
pub fn decode_tuple(text: &str) -> Option<Vec<String>> {
    let inner = text.trim().strip_prefix('(')?.strip_suffix(')')?;
    let mut chars = inner.chars().peekable();
    let mut items = Vec::new();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let quote = match chars.next() {
            Some(q @ ('\'' | '"')) => q,
            None => break,
            Some(_) => return None,
        };

        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return None,
        }
    }

    Some(items)
}

/// Muestras de una estratificación dentro de (región, pregunta)
#[derive(Debug, Clone, PartialEq)]
pub struct Stratum {
    /// Clave codificada tal como se cargó
    pub key: String,
    pub samples: Vec<f64>,
}

/// Una región con sus preguntas
#[derive(Debug, Clone, Default)]
pub struct Region {
    name: String,
    questions: HashMap<String, Vec<Stratum>>,
}

impl Region {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Estratos de una pregunta, en orden de aparición
    pub fn strata(&self, question: &str) -> Option<&[Stratum]> {
        self.questions.get(question).map(|s| s.as_slice())
    }

    /// Concatenación de todas las muestras de la pregunta
    pub fn samples(&self, question: &str) -> Option<Vec<f64>> {
        self.strata(question).map(|strata| {
            strata
                .iter()
                .flat_map(|s| s.samples.iter().copied())
                .collect()
        })
    }
}

/// Dataset completo
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    regions: Vec<Region>,
    index: HashMap<String, usize>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega una muestra. Sólo se usa durante la carga.
    pub fn insert(&mut self, region: &str, question: &str, key: &str, value: f64) {
        let idx = match self.index.get(region) {
            Some(&idx) => idx,
            None => {
                self.regions.push(Region {
                    name: region.to_string(),
                    questions: HashMap::new(),
                });
                self.index.insert(region.to_string(), self.regions.len() - 1);
                self.regions.len() - 1
            }
        };

        let strata = self.regions[idx]
            .questions
            .entry(question.to_string())
            .or_default();

        match strata.iter_mut().find(|s| s.key == key) {
            Some(stratum) => stratum.samples.push(value),
            None => strata.push(Stratum {
                key: key.to_string(),
                samples: vec![value],
            }),
        }
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.index.get(name).map(|&idx| &self.regions[idx])
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn has_question(&self, question: &str) -> bool {
        self.regions.iter().any(|r| r.questions.contains_key(question))
    }
}
