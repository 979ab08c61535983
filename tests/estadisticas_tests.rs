use notador::config::TablasMapeo;
use notador::estadisticas::{calcular_estadisticas, normalize_name, parsear_nota, ColumnasAdministrativas};
use notador::models::Fila;

fn admin() -> ColumnasAdministrativas {
    ColumnasAdministrativas::new(&TablasMapeo::default().columnas_administrativas)
}

fn fila(pares: &[(&str, &str)]) -> Fila {
    pares.iter().map(|(c, v)| (c.to_string(), v.to_string())).collect()
}

#[test]
fn test_promedio_y_perdidas_con_coma_decimal() {
    let f = fila(&[("Matemáticas", "4,5"), ("Inglés", "3.0"), ("GRUPO", "A")]);
    let stats = calcular_estadisticas(&f, &admin(), 3.5);
    assert_eq!(stats.promedio, 3.75);
    assert_eq!(stats.materias_perdidas, 1);
}

#[test]
fn test_fila_vacia_da_cero() {
    let stats = calcular_estadisticas(&Fila::new(), &admin(), 3.5);
    assert_eq!(stats.promedio, 0.0);
    assert_eq!(stats.materias_perdidas, 0);
}

#[test]
fn test_columnas_administrativas_con_tildes_y_mayusculas() {
    let admin = admin();
    for col in ["PERÍODO", "periodo", " Periodo ", "Mención de honor", "mencion de honor", "ÁREAS DEFICITADAS", "", "  "] {
        assert!(admin.es_administrativa(col), "debía ser administrativa: {:?}", col);
    }
    for col in ["Matemáticas", "Inglés", "Edu, física"] {
        assert!(!admin.es_administrativa(col), "no debía ser administrativa: {:?}", col);
    }
}

#[test]
fn test_duplicados_con_sufijo_son_administrativos() {
    let admin = admin();
    assert!(admin.es_administrativa("GRUPO.1"));
    assert!(admin.es_administrativa("Promedio.2"));
    assert!(!admin.es_administrativa("Matemáticas.1"));

    let f = fila(&[("Matemáticas", "4"), ("GRUPO.1", "2"), ("Promedio", "1")]);
    let stats = calcular_estadisticas(&f, &admin, 3.5);
    assert_eq!(stats.promedio, 4.0);
    assert_eq!(stats.materias_perdidas, 0);
}

#[test]
fn test_valores_no_numericos_se_ignoran() {
    let f = fila(&[("Matemáticas", "4"), ("Inglés", "N/A"), ("Artística", ""), ("Ética", "nan"), ("Física", "inf")]);
    let stats = calcular_estadisticas(&f, &admin(), 3.5);
    assert_eq!(stats.promedio, 4.0);
    assert_eq!(stats.materias_perdidas, 0);
}

#[test]
fn test_redondeo_a_dos_decimales_y_umbral_estricto() {
    let f = fila(&[("A", "4"), ("B", "3.5"), ("C", "4")]);
    let stats = calcular_estadisticas(&f, &admin(), 3.5);
    assert_eq!(stats.promedio, 3.83);
    // 3.5 no es perdida
    assert_eq!(stats.materias_perdidas, 0);
}

#[test]
fn test_empate_de_redondeo_va_al_par() {
    let f = fila(&[("Matemáticas", "4,25"), ("Inglés", "4")]);
    assert_eq!(calcular_estadisticas(&f, &admin(), 3.5).promedio, 4.12);

    let f = fila(&[("Matemáticas", "4,75"), ("Inglés", "4")]);
    assert_eq!(calcular_estadisticas(&f, &admin(), 3.5).promedio, 4.38);
}

#[test]
fn test_parsear_nota() {
    assert_eq!(parsear_nota(" 4,25 "), Some(4.25));
    assert_eq!(parsear_nota("3"), Some(3.0));
    assert_eq!(parsear_nota(""), None);
    assert_eq!(parsear_nota("cuatro"), None);
    assert_eq!(parsear_nota("NaN"), None);
}

#[test]
fn test_normalize_name() {
    assert_eq!(normalize_name(" PERÍODO "), "periodo");
    assert_eq!(normalize_name("Áreas Deficitadas"), "areas deficitadas");
    // forma descompuesta: "e" + acento combinante
    assert_eq!(normalize_name("Me\u{0301}ncion"), "mencion");
    assert_eq!(normalize_name("Ñandú"), "nandu");
}
