//! # Extracción de Datos para Jobs
//! src/operations/extract.rs
//!
//! Resuelve una petición (pregunta y, opcionalmente, región) contra el
//! `Dataset` y produce el `JobData` que ejecutará un worker. Los errores se
//! devuelven aquí, antes de crear el job, así que una petición inválida no
//! consume un id.

use super::{JobData, OrderedMap, Samples, GLOBAL_KEY};
use crate::dataset::{decode_tuple, encode_tuple, Dataset, Region, StratKey};
use crate::error::ExtractError;

/// región → todas las muestras de la pregunta en esa región
///
/// Las regiones sin la pregunta se omiten.
pub fn by_question(dataset: &Dataset, question: &str) -> Result<JobData, ExtractError> {
    let samples: Samples = dataset
        .regions()
        .filter_map(|region| region.samples(question).map(|s| (region.name(), s)))
        .collect();

    if samples.is_empty() {
        return Err(ExtractError::InvalidQuestion);
    }
    Ok(JobData::Keyed(samples))
}

/// `global_mean` → todas las muestras de la pregunta, de todas las regiones
pub fn global_for_question(dataset: &Dataset, question: &str) -> Result<JobData, ExtractError> {
    let all: Vec<f64> = dataset
        .regions()
        .filter_map(|region| region.samples(question))
        .flatten()
        .collect();

    if all.is_empty() {
        return Err(ExtractError::InvalidQuestion);
    }

    let mut samples = OrderedMap::new();
    samples.push(GLOBAL_KEY, all);
    Ok(JobData::Keyed(samples))
}

/// Una sola región → sus muestras de la pregunta
pub fn for_state(dataset: &Dataset, question: &str, state: &str) -> Result<JobData, ExtractError> {
    let region = find_region(dataset, state)?;
    let values = region
        .samples(question)
        .ok_or(ExtractError::InvalidQuestion)?;

    let mut samples = OrderedMap::new();
    samples.push(region.name(), values);
    Ok(JobData::Keyed(samples))
}

/// `('Region', 'Category', 'Value')` → muestras, para toda región con la pregunta
///
/// Se omiten estratos con categoría o valor vacío.
pub fn by_category(dataset: &Dataset, question: &str) -> Result<JobData, ExtractError> {
    if !dataset.has_question(question) {
        return Err(ExtractError::InvalidQuestion);
    }

    let mut samples = OrderedMap::new();
    for region in dataset.regions() {
        let Some(strata) = region.strata(question) else {
            continue;
        };

        for stratum in strata {
            let key = StratKey::decode(&stratum.key)
                .ok_or_else(|| ExtractError::MalformedKey(stratum.key.clone()))?;

            if key.category.is_empty() || key.value.is_empty() {
                continue;
            }

            let new_key = encode_tuple(&[region.name(), &key.category, &key.value]);
            samples.push(new_key, stratum.samples.clone());
        }
    }

    Ok(JobData::Keyed(samples))
}

/// región → (`('Category', 'Value')` → muestras)
pub fn state_by_category(
    dataset: &Dataset,
    question: &str,
    state: &str,
) -> Result<JobData, ExtractError> {
    let region = find_region(dataset, state)?;
    let strata = region
        .strata(question)
        .ok_or(ExtractError::InvalidQuestion)?;

    let mut inner = OrderedMap::new();
    for stratum in strata {
        if decode_tuple(&stratum.key).is_none() {
            return Err(ExtractError::MalformedKey(stratum.key.clone()));
        }
        inner.push(stratum.key.clone(), stratum.samples.clone());
    }

    let mut groups = OrderedMap::new();
    groups.push(region.name(), inner);
    Ok(JobData::Grouped(groups))
}

fn find_region<'a>(dataset: &'a Dataset, state: &str) -> Result<&'a Region, ExtractError> {
    dataset.region(state).ok_or(ExtractError::InvalidState)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::Operation;

    const Q1: &str = "Q1";

    fn dataset() -> Dataset {
        let total = StratKey::new("Total", "Total").encode();
        let male = StratKey::new("Sex", "Male").encode();
        let blank = StratKey::new("", "").encode();

        let mut ds = Dataset::new();
        ds.insert("Alabama", Q1, &total, 28.6);
        ds.insert("Alabama", Q1, &total, 31.4);
        ds.insert("Alabama", Q1, &male, 40.0);
        ds.insert("Alabama", Q1, &blank, 99.0);
        ds.insert("Alaska", Q1, &total, 33.4);
        ds.insert("Alaska", "Q2", &total, 10.0);
        ds
    }

    fn keyed(data: JobData) -> Samples {
        match data {
            JobData::Keyed(s) => s,
            JobData::Grouped(_) => panic!("expected keyed data"),
        }
    }

    #[test]
    fn test_by_question() {
        let samples = keyed(by_question(&dataset(), Q1).unwrap());
        assert_eq!(samples.keys().collect::<Vec<_>>(), vec!["Alabama", "Alaska"]);
        assert_eq!(samples.get("Alabama").unwrap(), &vec![28.6, 31.4, 40.0, 99.0]);
    }

    #[test]
    fn test_by_question_skips_regions_without_question() {
        let samples = keyed(by_question(&dataset(), "Q2").unwrap());
        assert_eq!(samples.keys().collect::<Vec<_>>(), vec!["Alaska"]);
    }

    #[test]
    fn test_unknown_question() {
        let ds = dataset();
        assert_eq!(by_question(&ds, "nope"), Err(ExtractError::InvalidQuestion));
        assert_eq!(global_for_question(&ds, "nope"), Err(ExtractError::InvalidQuestion));
        assert_eq!(by_category(&ds, "nope"), Err(ExtractError::InvalidQuestion));
    }

    #[test]
    fn test_global_for_question() {
        let samples = keyed(global_for_question(&dataset(), "Q2").unwrap());
        assert_eq!(samples.len(), 1);
        assert_eq!(samples.get(GLOBAL_KEY).unwrap(), &vec![10.0]);
    }

    #[test]
    fn test_for_state() {
        let ds = dataset();
        let samples = keyed(for_state(&ds, Q1, "Alaska").unwrap());
        assert_eq!(samples.0, vec![("Alaska".to_string(), vec![33.4])]);

        assert_eq!(for_state(&ds, Q1, "Atlantis"), Err(ExtractError::InvalidState));
        assert_eq!(for_state(&ds, "Q2", "Alabama"), Err(ExtractError::InvalidQuestion));
    }

    #[test]
    fn test_by_category_skips_blank_strata() {
        let samples = keyed(by_category(&dataset(), Q1).unwrap());
        assert_eq!(
            samples.keys().collect::<Vec<_>>(),
            vec![
                "('Alabama', 'Total', 'Total')",
                "('Alabama', 'Sex', 'Male')",
                "('Alaska', 'Total', 'Total')",
            ]
        );

        let out = Operation::SortedMeansByKey
            .apply(&JobData::Keyed(samples), None)
            .unwrap();
        let means = out.as_means().unwrap();
        assert_eq!(means.0[0].0, "('Alabama', 'Sex', 'Male')");
        assert!((means.get("('Alabama', 'Total', 'Total')").unwrap() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_key() {
        let mut ds = dataset();
        ds.insert("Ohio", Q1, "Total|Total", 1.0);

        assert_eq!(
            by_category(&ds, Q1),
            Err(ExtractError::MalformedKey("Total|Total".to_string()))
        );
        assert_eq!(
            state_by_category(&ds, Q1, "Ohio"),
            Err(ExtractError::MalformedKey("Total|Total".to_string()))
        );
    }

    #[test]
    fn test_state_by_category() {
        let data = state_by_category(&dataset(), Q1, "Alabama").unwrap();
        let out = Operation::NestedMeansByKey.apply(&data, None).unwrap();
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(
            json,
            r#"{"Alabama":{"('', '')":99.0,"('Sex', 'Male')":40.0,"('Total', 'Total')":30.0}}"#
        );
    }

    #[test]
    fn test_state_by_category_invalid() {
        let ds = dataset();
        assert_eq!(
            state_by_category(&ds, Q1, "Atlantis"),
            Err(ExtractError::InvalidState)
        );
        assert_eq!(
            state_by_category(&ds, "Q2", "Alabama"),
            Err(ExtractError::InvalidQuestion)
        );
    }
}
