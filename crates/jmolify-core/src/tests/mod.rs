mod jmol;
