//! ISO 3166-1 country names with common alternates, keyed by alpha-2 code.

/// ISO 3166-1 alpha-2 code for an upper-cased country name or code.
pub fn alpha2(name: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .find(|(code, names)| *code == name || names.contains(&name))
        .map(|(code, _)| *code)
}

/// Every assigned alpha-2 code; the first name is the ISO short name.
pub const COUNTRIES: &[(&str, &[&str])] = &[
    ("AD", &["ANDORRA"]),
    ("AE", &["UNITED ARAB EMIRATES", "UAE", "EMIRATES"]),
    ("AF", &["AFGHANISTAN"]),
    ("AG", &["ANTIGUA AND BARBUDA", "ANTIGUA"]),
    ("AI", &["ANGUILLA"]),
    ("AL", &["ALBANIA"]),
    ("AM", &["ARMENIA"]),
    ("AO", &["ANGOLA"]),
    ("AQ", &["ANTARCTICA"]),
    ("AR", &["ARGENTINA"]),
    ("AS", &["AMERICAN SAMOA"]),
    ("AT", &["AUSTRIA"]),
    ("AU", &["AUSTRALIA"]),
    ("AW", &["ARUBA"]),
    ("AX", &["ALAND ISLANDS", "ÅLAND ISLANDS"]),
    ("AZ", &["AZERBAIJAN"]),
    ("BA", &["BOSNIA AND HERZEGOVINA", "BOSNIA"]),
    ("BB", &["BARBADOS"]),
    ("BD", &["BANGLADESH"]),
    ("BE", &["BELGIUM"]),
    ("BF", &["BURKINA FASO"]),
    ("BG", &["BULGARIA"]),
    ("BH", &["BAHRAIN"]),
    ("BI", &["BURUNDI"]),
    ("BJ", &["BENIN"]),
    ("BL", &["SAINT BARTHELEMY", "SAINT BARTHÉLEMY", "ST BARTHELEMY"]),
    ("BM", &["BERMUDA"]),
    ("BN", &["BRUNEI DARUSSALAM", "BRUNEI"]),
    ("BO", &["BOLIVIA, PLURINATIONAL STATE OF", "BOLIVIA"]),
    ("BQ", &["BONAIRE, SINT EUSTATIUS AND SABA", "BONAIRE", "CARIBBEAN NETHERLANDS"]),
    ("BR", &["BRAZIL"]),
    ("BS", &["BAHAMAS", "THE BAHAMAS"]),
    ("BT", &["BHUTAN"]),
    ("BV", &["BOUVET ISLAND"]),
    ("BW", &["BOTSWANA"]),
    ("BY", &["BELARUS"]),
    ("BZ", &["BELIZE"]),
    ("CA", &["CANADA"]),
    ("CC", &["COCOS (KEELING) ISLANDS", "COCOS ISLANDS"]),
    (
        "CD",
        &[
            "CONGO, THE DEMOCRATIC REPUBLIC OF THE",
            "DEMOCRATIC REPUBLIC OF THE CONGO",
            "DR CONGO",
            "DRC",
            "CONGO DRC",
            "CONGO KINSHASA",
        ],
    ),
    ("CF", &["CENTRAL AFRICAN REPUBLIC"]),
    ("CG", &["CONGO", "REPUBLIC OF THE CONGO", "CONGO BRAZZAVILLE"]),
    ("CH", &["SWITZERLAND"]),
    ("CI", &["COTE D'IVOIRE", "CÔTE D'IVOIRE", "IVORY COAST"]),
    ("CK", &["COOK ISLANDS"]),
    ("CL", &["CHILE"]),
    ("CM", &["CAMEROON"]),
    ("CN", &["CHINA"]),
    ("CO", &["COLOMBIA"]),
    ("CR", &["COSTA RICA"]),
    ("CU", &["CUBA"]),
    ("CV", &["CABO VERDE", "CAPE VERDE"]),
    ("CW", &["CURACAO", "CURAÇAO"]),
    ("CX", &["CHRISTMAS ISLAND"]),
    ("CY", &["CYPRUS"]),
    ("CZ", &["CZECHIA", "CZECH REPUBLIC"]),
    ("DE", &["GERMANY"]),
    ("DJ", &["DJIBOUTI"]),
    ("DK", &["DENMARK"]),
    ("DM", &["DOMINICA"]),
    ("DO", &["DOMINICAN REPUBLIC"]),
    ("DZ", &["ALGERIA"]),
    ("EC", &["ECUADOR"]),
    ("EE", &["ESTONIA"]),
    ("EG", &["EGYPT"]),
    ("EH", &["WESTERN SAHARA"]),
    ("ER", &["ERITREA"]),
    ("ES", &["SPAIN"]),
    ("ET", &["ETHIOPIA"]),
    ("FI", &["FINLAND"]),
    ("FJ", &["FIJI"]),
    ("FK", &["FALKLAND ISLANDS (MALVINAS)", "FALKLAND ISLANDS"]),
    ("FM", &["MICRONESIA, FEDERATED STATES OF", "MICRONESIA"]),
    ("FO", &["FAROE ISLANDS"]),
    ("FR", &["FRANCE"]),
    ("GA", &["GABON"]),
    (
        "GB",
        &[
            "UNITED KINGDOM",
            "UK",
            "GREAT BRITAIN",
            "BRITAIN",
            "ENGLAND",
            "SCOTLAND",
            "WALES",
            "NORTHERN IRELAND",
        ],
    ),
    ("GD", &["GRENADA"]),
    ("GE", &["GEORGIA"]),
    ("GF", &["FRENCH GUIANA"]),
    ("GG", &["GUERNSEY"]),
    ("GH", &["GHANA"]),
    ("GI", &["GIBRALTAR"]),
    ("GL", &["GREENLAND"]),
    ("GM", &["GAMBIA", "THE GAMBIA"]),
    ("GN", &["GUINEA"]),
    ("GP", &["GUADELOUPE"]),
    ("GQ", &["EQUATORIAL GUINEA"]),
    ("GR", &["GREECE"]),
    ("GS", &["SOUTH GEORGIA AND THE SOUTH SANDWICH ISLANDS"]),
    ("GT", &["GUATEMALA"]),
    ("GU", &["GUAM"]),
    ("GW", &["GUINEA-BISSAU", "GUINEA BISSAU"]),
    ("GY", &["GUYANA"]),
    ("HK", &["HONG KONG"]),
    ("HM", &["HEARD ISLAND AND MCDONALD ISLANDS"]),
    ("HN", &["HONDURAS"]),
    ("HR", &["CROATIA"]),
    ("HT", &["HAITI"]),
    ("HU", &["HUNGARY"]),
    ("ID", &["INDONESIA"]),
    ("IE", &["IRELAND"]),
    ("IL", &["ISRAEL"]),
    ("IM", &["ISLE OF MAN"]),
    ("IN", &["INDIA"]),
    ("IO", &["BRITISH INDIAN OCEAN TERRITORY"]),
    ("IQ", &["IRAQ"]),
    ("IR", &["IRAN, ISLAMIC REPUBLIC OF", "IRAN"]),
    ("IS", &["ICELAND"]),
    ("IT", &["ITALY"]),
    ("JE", &["JERSEY"]),
    ("JM", &["JAMAICA"]),
    ("JO", &["JORDAN"]),
    ("JP", &["JAPAN"]),
    ("KE", &["KENYA"]),
    ("KG", &["KYRGYZSTAN"]),
    ("KH", &["CAMBODIA"]),
    ("KI", &["KIRIBATI"]),
    ("KM", &["COMOROS"]),
    ("KN", &["SAINT KITTS AND NEVIS", "ST KITTS AND NEVIS"]),
    ("KP", &["KOREA, DEMOCRATIC PEOPLE'S REPUBLIC OF", "NORTH KOREA"]),
    ("KR", &["KOREA, REPUBLIC OF", "SOUTH KOREA", "KOREA"]),
    ("KW", &["KUWAIT"]),
    ("KY", &["CAYMAN ISLANDS"]),
    ("KZ", &["KAZAKHSTAN"]),
    ("LA", &["LAO PEOPLE'S DEMOCRATIC REPUBLIC", "LAOS", "LAO"]),
    ("LB", &["LEBANON"]),
    ("LC", &["SAINT LUCIA", "ST LUCIA"]),
    ("LI", &["LIECHTENSTEIN"]),
    ("LK", &["SRI LANKA"]),
    ("LR", &["LIBERIA"]),
    ("LS", &["LESOTHO"]),
    ("LT", &["LITHUANIA"]),
    ("LU", &["LUXEMBOURG"]),
    ("LV", &["LATVIA"]),
    ("LY", &["LIBYA"]),
    ("MA", &["MOROCCO"]),
    ("MC", &["MONACO"]),
    ("MD", &["MOLDOVA, REPUBLIC OF", "MOLDOVA"]),
    ("ME", &["MONTENEGRO"]),
    ("MF", &["SAINT MARTIN (FRENCH PART)", "SAINT MARTIN"]),
    ("MG", &["MADAGASCAR"]),
    ("MH", &["MARSHALL ISLANDS"]),
    ("MK", &["NORTH MACEDONIA", "MACEDONIA"]),
    ("ML", &["MALI"]),
    ("MM", &["MYANMAR", "BURMA"]),
    ("MN", &["MONGOLIA"]),
    ("MO", &["MACAO", "MACAU"]),
    ("MP", &["NORTHERN MARIANA ISLANDS"]),
    ("MQ", &["MARTINIQUE"]),
    ("MR", &["MAURITANIA"]),
    ("MS", &["MONTSERRAT"]),
    ("MT", &["MALTA"]),
    ("MU", &["MAURITIUS"]),
    ("MV", &["MALDIVES"]),
    ("MW", &["MALAWI"]),
    ("MX", &["MEXICO"]),
    ("MY", &["MALAYSIA"]),
    ("MZ", &["MOZAMBIQUE"]),
    ("NA", &["NAMIBIA"]),
    ("NC", &["NEW CALEDONIA"]),
    ("NE", &["NIGER"]),
    ("NF", &["NORFOLK ISLAND"]),
    ("NG", &["NIGERIA"]),
    ("NI", &["NICARAGUA"]),
    ("NL", &["NETHERLANDS", "THE NETHERLANDS", "HOLLAND"]),
    ("NO", &["NORWAY"]),
    ("NP", &["NEPAL"]),
    ("NR", &["NAURU"]),
    ("NU", &["NIUE"]),
    ("NZ", &["NEW ZEALAND"]),
    ("OM", &["OMAN"]),
    ("PA", &["PANAMA"]),
    ("PE", &["PERU"]),
    ("PF", &["FRENCH POLYNESIA"]),
    ("PG", &["PAPUA NEW GUINEA"]),
    ("PH", &["PHILIPPINES"]),
    ("PK", &["PAKISTAN"]),
    ("PL", &["POLAND"]),
    ("PM", &["SAINT PIERRE AND MIQUELON"]),
    ("PN", &["PITCAIRN"]),
    ("PR", &["PUERTO RICO"]),
    ("PS", &["PALESTINE, STATE OF", "PALESTINE"]),
    ("PT", &["PORTUGAL"]),
    ("PW", &["PALAU"]),
    ("PY", &["PARAGUAY"]),
    ("QA", &["QATAR"]),
    ("RE", &["REUNION", "RÉUNION"]),
    ("RO", &["ROMANIA"]),
    ("RS", &["SERBIA"]),
    ("RU", &["RUSSIAN FEDERATION", "RUSSIA"]),
    ("RW", &["RWANDA"]),
    ("SA", &["SAUDI ARABIA"]),
    ("SB", &["SOLOMON ISLANDS"]),
    ("SC", &["SEYCHELLES"]),
    ("SD", &["SUDAN"]),
    ("SE", &["SWEDEN"]),
    ("SG", &["SINGAPORE"]),
    ("SH", &["SAINT HELENA, ASCENSION AND TRISTAN DA CUNHA", "SAINT HELENA"]),
    ("SI", &["SLOVENIA"]),
    ("SJ", &["SVALBARD AND JAN MAYEN"]),
    ("SK", &["SLOVAKIA"]),
    ("SL", &["SIERRA LEONE"]),
    ("SM", &["SAN MARINO"]),
    ("SN", &["SENEGAL"]),
    ("SO", &["SOMALIA"]),
    ("SR", &["SURINAME"]),
    ("SS", &["SOUTH SUDAN"]),
    ("ST", &["SAO TOME AND PRINCIPE", "SÃO TOMÉ AND PRÍNCIPE"]),
    ("SV", &["EL SALVADOR"]),
    ("SX", &["SINT MAARTEN (DUTCH PART)", "SINT MAARTEN"]),
    ("SY", &["SYRIAN ARAB REPUBLIC", "SYRIA"]),
    ("SZ", &["ESWATINI", "SWAZILAND"]),
    ("TC", &["TURKS AND CAICOS ISLANDS"]),
    ("TD", &["CHAD"]),
    ("TF", &["FRENCH SOUTHERN TERRITORIES"]),
    ("TG", &["TOGO"]),
    ("TH", &["THAILAND"]),
    ("TJ", &["TAJIKISTAN"]),
    ("TK", &["TOKELAU"]),
    ("TL", &["TIMOR-LESTE", "EAST TIMOR"]),
    ("TM", &["TURKMENISTAN"]),
    ("TN", &["TUNISIA"]),
    ("TO", &["TONGA"]),
    ("TR", &["TURKEY", "TÜRKIYE", "TURKIYE"]),
    ("TT", &["TRINIDAD AND TOBAGO", "TRINIDAD"]),
    ("TV", &["TUVALU"]),
    ("TW", &["TAIWAN, PROVINCE OF CHINA", "TAIWAN"]),
    ("TZ", &["TANZANIA, UNITED REPUBLIC OF", "TANZANIA"]),
    ("UA", &["UKRAINE"]),
    ("UG", &["UGANDA"]),
    ("UM", &["UNITED STATES MINOR OUTLYING ISLANDS"]),
    ("US", &["UNITED STATES", "UNITED STATES OF AMERICA", "USA", "AMERICA"]),
    ("UY", &["URUGUAY"]),
    ("UZ", &["UZBEKISTAN"]),
    ("VA", &["HOLY SEE (VATICAN CITY STATE)", "HOLY SEE", "VATICAN", "VATICAN CITY"]),
    ("VC", &["SAINT VINCENT AND THE GRENADINES", "ST VINCENT AND THE GRENADINES"]),
    ("VE", &["VENEZUELA, BOLIVARIAN REPUBLIC OF", "VENEZUELA"]),
    ("VG", &["VIRGIN ISLANDS, BRITISH", "BRITISH VIRGIN ISLANDS"]),
    ("VI", &["VIRGIN ISLANDS, U.S.", "US VIRGIN ISLANDS", "U.S. VIRGIN ISLANDS"]),
    ("VN", &["VIET NAM", "VIETNAM"]),
    ("VU", &["VANUATU"]),
    ("WF", &["WALLIS AND FUTUNA"]),
    ("WS", &["SAMOA"]),
    ("YE", &["YEMEN"]),
    ("YT", &["MAYOTTE"]),
    ("ZA", &["SOUTH AFRICA"]),
    ("ZM", &["ZAMBIA"]),
    ("ZW", &["ZIMBABWE"]),
];
