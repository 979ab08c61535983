use notador::config::TablasMapeo;
use notador::excel::{columnas_faltantes, normalizar_columnas};
use notador::models::Fila;

fn fila(pares: &[(&str, &str)]) -> Fila {
    pares.iter().map(|(c, v)| (c.to_string(), v.to_string())).collect()
}

#[test]
fn test_variantes_se_renombran_a_canonicas() {
    let tablas = TablasMapeo::default();
    let original = fila(&[(" ESTUDIANTE ", "123456789 - A B"), ("Group", "B"), ("período", "2"), ("Matemáticas", "4")]);
    let norm = normalizar_columnas(&original, &tablas.sinonimos_columnas);

    assert_eq!(norm.get("estudiante"), Some("123456789 - A B"));
    assert_eq!(norm.get("GRUPO"), Some("B"));
    assert_eq!(norm.get("PERIODO"), Some("2"));
    assert_eq!(norm.get("Matemáticas"), Some("4"));
    assert_eq!(norm.columnas().collect::<Vec<_>>(), vec!["estudiante", "GRUPO", "PERIODO", "Matemáticas"]);
}

#[test]
fn test_canonica_presente_gana_y_variantes_quedan() {
    let tablas = TablasMapeo::default();
    let original = fila(&[("grupo", "x"), ("GRUPO", "A")]);
    let norm = normalizar_columnas(&original, &tablas.sinonimos_columnas);
    assert_eq!(norm.get("GRUPO"), Some("A"));
    assert_eq!(norm.get("grupo"), Some("x"));
    assert_eq!(norm.len(), 2);
}

#[test]
fn test_primera_variante_en_orden_declarado() {
    let tablas = TablasMapeo::default();
    // "grupo" va antes que "Group" en la lista de variantes
    let original = fila(&[("Group", "g"), ("grupo", "a")]);
    let norm = normalizar_columnas(&original, &tablas.sinonimos_columnas);
    assert_eq!(norm.get("GRUPO"), Some("a"));
    assert_eq!(norm.get("Group"), Some("g"));
}

#[test]
fn test_normalizar_es_idempotente() {
    let tablas = TablasMapeo::default();
    let original = fila(&[("NOMBRE", "123456789 - A B"), ("grupo", "A"), ("GRUPO.1", "B"), ("PERIODO.1", "1")]);
    let una = normalizar_columnas(&original, &tablas.sinonimos_columnas);
    let dos = normalizar_columnas(&una, &tablas.sinonimos_columnas);
    assert_eq!(una, dos);
}

#[test]
fn test_sin_columnas_canonicas_no_falla() {
    let tablas = TablasMapeo::default();
    let original = fila(&[("Matemáticas", "4"), ("Inglés", "3")]);
    let norm = normalizar_columnas(&original, &tablas.sinonimos_columnas);
    assert_eq!(norm, original);
    assert!(normalizar_columnas(&Fila::new(), &tablas.sinonimos_columnas).is_empty());
}

#[test]
fn test_columnas_faltantes() {
    let columnas = vec!["estudiante".to_string(), "GRUPO".to_string()];
    assert!(columnas_faltantes(&columnas, &["estudiante"]).is_empty());
    assert_eq!(columnas_faltantes(&columnas, &["estudiante", "PERIODO"]), vec!["PERIODO"]);
}
