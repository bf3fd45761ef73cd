//! Resolver tiers and CFOP-mapping precedence.

use notafiscal::classificacao::{
    EntradaCfop, MapaCfop, analisar_notas, buscar_natureza, classificar_preenchendo,
    resumo_analise, tem_mapeamento,
};
use notafiscal::core::NotaFiscal;

#[test]
fn chave_exata_vence_qualquer_outro_nivel() {
    // O texto contém a palavra-chave "consultoria e gestão", mas a chave
    // exata deve decidir antes de qualquer varredura.
    let entrada = buscar_natureza("Serviço de consultoria e gestão - dentro do estado").unwrap();
    assert_eq!(entrada.chave, "Serviço de consultoria e gestão - dentro do estado");
    assert_eq!(entrada.cfop, "1933034");
    assert_eq!(entrada.tabela_ctb, "2014");
}

#[test]
fn consulta_de_existencia() {
    assert!(tem_mapeamento("Serviço de software"));
    assert!(!tem_mapeamento("frete rodoviário"));
    assert!(!tem_mapeamento(""));
}

#[test]
fn medicas_sem_retido_nao_confunde_com_retido() {
    let entrada = buscar_natureza("Serviço despesas médicas - dentro do estado").unwrap();
    assert_eq!(entrada.cfop, "1933025");
    assert_eq!(entrada.tabela_ctb, "2005");
}

#[test]
fn variante_nao_exata_resolve_pela_palavra_chave() {
    // Não é chave exata; deve casar pela palavra-chave "despesas médicas
    // com retido" e cair na entrada que duplica os códigos do serviço
    // administrativo com retido, duplicação herdada da tabela de origem.
    let medicas = buscar_natureza("Serviço despesas médicas com retido - fora do Estado").unwrap();
    let administrativos =
        buscar_natureza("Serviço administrativos com retido - dentro do estado").unwrap();
    assert_eq!(medicas.cfop, "1933023");
    assert_eq!(medicas.tabela_ctb, administrativos.tabela_ctb);
    assert_eq!(medicas.tabela_ctb, "2003");
}

#[test]
fn resolver_duas_vezes_nao_altera_classificado() {
    let mut nota = NotaFiscal {
        natureza: "Serviço de software".into(),
        ..Default::default()
    };
    classificar_preenchendo(&mut nota);
    assert_eq!(nota.cfop_natureza, "2933027");
    assert_eq!(nota.tabela_ctb, "2007");

    let antes = nota.clone();
    classificar_preenchendo(&mut nota);
    assert_eq!(nota, antes, "reclassificar um registro já classificado é inócuo");
}

fn mapa() -> MapaCfop {
    let mut mapa = MapaCfop::new();
    mapa.insert(
        "1933034".into(),
        EntradaCfop {
            descricao: "Serviço de consultoria e gestão".into(),
            tabela_ctb: "7777".into(),
            conta_contabil: "3300".into(),
        },
    );
    mapa.insert(
        "5102".into(),
        EntradaCfop {
            descricao: "Venda de mercadoria adquirida".into(),
            tabela_ctb: "1001".into(),
            conta_contabil: "3001".into(),
        },
    );
    mapa
}

#[test]
fn tabela_da_natureza_prevalece_sobre_a_do_mapa() {
    let mut notas = vec![NotaFiscal {
        natureza: "Serviço de consultoria e gestão - dentro do estado".into(),
        cfop_natureza: "1933034".into(),
        ..Default::default()
    }];
    analisar_notas(&mut notas, &mapa());
    // tabela da natureza (2014), não a do mapa (7777); conta só do mapa.
    assert_eq!(notas[0].tabela_ctb, "2014");
    assert_eq!(notas[0].conta_contabil, "3300");
}

#[test]
fn mapa_preenche_tabela_quando_natureza_nao_resolve() {
    let mut notas = vec![NotaFiscal {
        cfop: "5102".into(),
        ..Default::default()
    }];
    analisar_notas(&mut notas, &mapa());
    assert_eq!(notas[0].tabela_ctb, "1001");
    assert_eq!(notas[0].conta_contabil, "3001");
}

#[test]
fn cfop_proprio_consultado_antes_do_resolvido() {
    // Ambos os códigos existem no mapa; o cru decide.
    let mut notas = vec![NotaFiscal {
        cfop: "5102".into(),
        cfop_natureza: "1933034".into(),
        ..Default::default()
    }];
    analisar_notas(&mut notas, &mapa());
    assert_eq!(notas[0].conta_contabil, "3001");
}

#[test]
fn resumo_conta_notas_analisadas() {
    let mut notas = vec![
        NotaFiscal {
            natureza: "Serviço de consultoria".into(),
            cfop_natureza: "1933034".into(),
            ..Default::default()
        },
        NotaFiscal {
            natureza: "sem classificação possível".into(),
            ..Default::default()
        },
    ];
    analisar_notas(&mut notas, &MapaCfop::new());
    let resumo = resumo_analise(&notas);
    assert_eq!(resumo.total, 2);
    assert_eq!(resumo.analisadas, 1);
    assert_eq!(resumo.nao_analisadas, 1);
}
