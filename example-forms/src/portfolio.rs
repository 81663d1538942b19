use form_engine::{
    BoolOp, FieldConfig, FieldValue, FileOptions, FormData, FormDefinition, FormRecord, GridLayout,
    NumberOptions, RepeaterConfig, SelectBoxConfig, SelectElement, SelectOption,
    ValidationFeedback,
};

/// Portfolios hold at most this many positions.
pub const MAX_HOLDINGS: usize = 20;

/// Instruments offered for an asset class.
pub fn instruments_for(data: &FormData) -> Vec<SelectOption> {
    match data.get_str("asset_class") {
        Some("equity") => vec![
            SelectOption::new("ftse_mib", "FTSE MIB ETF"),
            SelectOption::new("msci_world", "MSCI World ETF"),
        ],
        Some("bond") => vec![
            SelectOption::new("btp_10y", "BTP 10 anni").with_secondary_text("Titolo di Stato"),
            SelectOption::new("corporate_eur", "Obbligazioni corporate EUR"),
        ],
        Some("cash") => vec![SelectOption::new("money_market", "Monetario")],
        _ => Vec::new(),
    }
}

/// The number of positions must stay within [`MAX_HOLDINGS`].
pub fn validate_holdings(value: &FieldValue, _: &FormData) -> ValidationFeedback {
    let count = value.as_list().map_or(0, <[FieldValue]>::len);
    if count > MAX_HOLDINGS {
        ValidationFeedback::invalid(format!("Massimo {MAX_HOLDINGS} posizioni."))
    } else {
        ValidationFeedback::valid()
    }
}

#[derive(Debug, Clone, PartialEq, FormRecord)]
pub struct Holding {
    pub isin: String,
    pub quantity: f64,
}

/// A model portfolio proposed to a customer.
#[derive(Debug, Clone, PartialEq, FormRecord)]
pub struct Portfolio {
    pub name: String,
    pub strategy: String,
    pub asset_class: String,
    pub instrument: String,
    pub amount: f64,
    pub holdings: Vec<Holding>,
    pub notes: Option<String>,
}

pub fn portfolio() -> FormDefinition {
    use PortfolioField as F;

    FormDefinition::new(vec![
        FieldConfig::text(F::Name).label("Nome portafoglio").required(),
        FieldConfig::select(
            F::Strategy,
            SelectBoxConfig::fixed(vec![
                SelectOption::new("income", "Reddito").with_secondary_text("Cedole regolari"),
                SelectOption::new("balanced", "Bilanciato"),
                SelectOption::new("growth", "Crescita").with_secondary_text("Orizzonte lungo"),
            ])
            .element(SelectElement::Cards),
        )
        .label("Strategia")
        .required(),
        FieldConfig::select(
            F::AssetClass,
            SelectBoxConfig::fixed(vec![
                SelectOption::placeholder("Seleziona...", false),
                SelectOption::new("equity", "Azionario"),
                SelectOption::new("bond", "Obbligazionario"),
                SelectOption::new("cash", "Liquidità"),
            ]),
        )
        .label("Classe di attivo")
        .required()
        .grid(GridLayout::span(6)),
        FieldConfig::select(
            F::Instrument,
            SelectBoxConfig::dependent([F::AssetClass], instruments_for).searchable(),
        )
        .label("Strumento")
        .required()
        .grid(GridLayout::span(6)),
        FieldConfig::number(
            F::Amount,
            NumberOptions::with_bounds(Some(0.0), Some(1_000_000.0)).with_step(500.0),
        )
        .label("Importo")
        .required(),
        FieldConfig::repeater(
            F::Holdings,
            RepeaterConfig::new(vec![
                FieldConfig::text(HoldingField::Isin).label("ISIN").required(),
                FieldConfig::number(
                    HoldingField::Quantity,
                    NumberOptions::with_bounds(Some(1.0), None).with_step(1.0),
                )
                .label("Quantità")
                .required(),
            ])
            .with_item_bounds(None, Some(MAX_HOLDINGS))
            .with_default_item(|| FormData::new().with("isin", "").with("quantity", 1))
            .with_add_label("Aggiungi posizione"),
        )
        .label("Posizioni")
        .validate_with(BoolOp::And, validate_holdings),
        FieldConfig::file_input("mandate", FileOptions::default().accept(".pdf"))
            .label("Mandato firmato"),
        FieldConfig::rich_text(F::Notes).label("Note"),
    ])
    .with_title("Portafoglio modello")
}
