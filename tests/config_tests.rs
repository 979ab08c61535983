use notador::config::{Configuracion, EtiquetasPlantilla, BIND_POR_DEFECTO};
use notador::{NotadorError, TablasMapeo};
use std::time::Duration;

#[test]
fn test_valores_de_fabrica() {
    let tablas = TablasMapeo::default();
    assert_eq!(tablas.nota_minima, 3.5);
    assert_eq!(tablas.titulo_tabla_areas, "ÁREAS");
    assert_eq!(tablas.areas.len(), 11);
    assert_eq!(tablas.exclusiones_por_grado[0].grado, 8);
    assert_eq!(tablas.etiquetas.periodo, vec!["PERÍODO".to_string()]);

    let config = Configuracion::default();
    assert_eq!(config.bind, BIND_POR_DEFECTO);
    assert_eq!(config.espera_pdf, Duration::from_secs(120));
    assert_eq!(config.soffice.to_string_lossy(), "soffice");
}

#[test]
fn test_cargar_tablas_parciales() {
    let dir = tempfile::tempdir().unwrap();
    let ruta = dir.path().join("tablas.json");
    std::fs::write(
        &ruta,
        r#"{
            "nota_minima": 3.0,
            "titulo_tabla_areas": "ASIGNATURAS",
            "etiquetas": { "grado": ["Grado:", "GRADO"] }
        }"#,
    )
    .unwrap();

    let tablas = TablasMapeo::cargar(&ruta).expect("Debe cargar las tablas");
    assert_eq!(tablas.nota_minima, 3.0);
    assert_eq!(tablas.titulo_tabla_areas, "ASIGNATURAS");
    assert_eq!(tablas.etiquetas.grado, vec!["Grado:".to_string(), "GRADO".to_string()]);
    // lo que no viene en el JSON queda de fábrica
    assert_eq!(tablas.etiquetas.promedio, EtiquetasPlantilla::default().promedio);
    assert_eq!(tablas.areas, TablasMapeo::default().areas);
    assert_eq!(tablas.hoja_consolidado, "consolidado");
}

#[test]
fn test_cargar_tablas_sin_archivo_o_invalidas() {
    let dir = tempfile::tempdir().unwrap();

    let err = TablasMapeo::cargar(dir.path().join("no.json")).unwrap_err();
    assert!(matches!(err, NotadorError::NoEncontrado { tipo: "de tablas", .. }));

    let ruta = dir.path().join("rota.json");
    std::fs::write(&ruta, "{ nota_minima: ").unwrap();
    let err = TablasMapeo::cargar(&ruta).unwrap_err();
    assert!(matches!(err, NotadorError::Json(_)));
    assert_eq!(err.tipo(), "ReadError");
}

#[test]
fn test_hoja_consolidado() {
    let tablas = TablasMapeo::default();
    assert!(tablas.es_hoja_consolidado("consolidado"));
    assert!(tablas.es_hoja_consolidado(" Consolidado "));
    assert!(!tablas.es_hoja_consolidado("7"));
    assert!(!tablas.es_hoja_consolidado("consolidado 2"));
}
