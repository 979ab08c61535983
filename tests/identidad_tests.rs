use notador::identidad::{nombre_seguro, parsear_campo_estudiante};

#[test]
fn test_campo_bien_formado() {
    let id = parsear_campo_estudiante("123456789 - PEREZ GOMEZ ANA MARIA").expect("Debe parsear el campo");
    assert_eq!(id.id, "123456789");
    assert_eq!(id.nombre_completo, "PEREZ GOMEZ ANA MARIA");
    assert_eq!(id.apellidos, "PEREZ GOMEZ");
    assert_eq!(id.nombres, "ANA MARIA");
}

#[test]
fn test_espacios_opcionales_alrededor_del_guion() {
    let pegado = parsear_campo_estudiante("000000042-RUIZ DIAZ LUIS").expect("Debe aceptar guion pegado");
    assert_eq!(pegado.id, "000000042");
    assert_eq!(pegado.nombre_completo, "RUIZ DIAZ LUIS");

    let holgado = parsear_campo_estudiante("987654321   -   ROJAS  PAZ  ELENA  ").expect("Debe recortar el nombre");
    assert_eq!(holgado.nombre_completo, "ROJAS  PAZ  ELENA");
    assert_eq!(holgado.apellidos, "ROJAS PAZ");
    assert_eq!(holgado.nombres, "ELENA");
}

#[test]
fn test_un_solo_token_queda_como_apellidos() {
    let id = parsear_campo_estudiante("111222333 - MADONNA").unwrap();
    assert_eq!(id.apellidos, "MADONNA");
    assert_eq!(id.nombres, "");
}

#[test]
fn test_campos_mal_formados_se_omiten() {
    for campo in [
        "",
        "12345678 - CORTO ID",
        "abc123456 - LETRAS",
        "123456789 PEREZ SIN GUION",
        "123456789 - ",
        "123456789 -    ",
        " 123456789 - ESPACIO INICIAL",
    ] {
        assert!(parsear_campo_estudiante(campo).is_none(), "no debía parsear: {:?}", campo);
    }
}

#[test]
fn test_nombre_seguro_reemplaza_separadores() {
    assert_eq!(nombre_seguro("PEREZ/GOMEZ\\ANA"), "PEREZ-GOMEZ-ANA");
    assert_eq!(nombre_seguro("RUIZ DIAZ LUIS"), "RUIZ DIAZ LUIS");
}
