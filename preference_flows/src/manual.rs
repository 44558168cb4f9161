/*!

This is the long-form manual for `preference_flows` and `prefflow`.

## Input files

Four files describe an election. The electorates are listed in a JSON file:

```text
[
  {"stub": "algester", "electorateName": "Algester"},
  {"stub": "aspley", "electorateName": "Aspley"}
]
```

The other three files are tables, either in CSV format (`.csv`) or in Excel format (`.xlsx`).
The first row must hold the column names below. The order of the columns does not matter and
extra columns are ignored. All the tables refer to electorates by their `stub`.

### Distribution of preferences

One row for every candidate receiving preferences from an excluded candidate.

```text
electorate,exclusion,fromParty,fromCandidate,toParty,toCandidate,preferences,votesDistributed,toRunningTotal,ballotOrder
aspley,1,The Greens,SMITH Jo,ALP,NGUYEN Bart,2101,3011,14502,2
aspley,1,The Greens,SMITH Jo,LNP,BROWN Amanda,910,3011,15977,1
```

- `exclusion` is the number of the exclusion round. The rounds of an electorate must be consecutive.
- `preferences` is the number of votes received by `toCandidate` in this round.
- `votesDistributed` is the number of votes of the excluded candidate distributed in this round.
- `toRunningTotal` is the total of `toCandidate` after this round. It never decreases.

### First preferences

```text
electorate,candidate,party,count,colour,ballotOrder
aspley,BROWN Amanda,LNP,13110,#1c4f9c,1
```

### Final tally

```text
electorate,party,count
aspley,LNP,15977
aspley,ALP,14502
```

In every electorate, the party with the highest count is the winner.

## The what-if explorer

The explorer looks at the electorates in which the votes of the source party (`The Greens` by
default) were the last ones to be distributed, to exactly two remaining candidates, one of them
from the designated party (`ALP` by default), and where the distributed votes are at least the
margin between the two candidates before the distribution.

For a percentage `p`, the designated candidate receives `p` percent of the distributed votes
(rounded half up) and the other candidate receives the rest. The new winners replace the actual
winners of these electorates in the seat tally; all the other electorates keep their winner.

The initial percentage is the share observed in the data over all these electorates. Until a
percentage is set, the what-if tables show the observed distributions and the actual seat tally.

## Configuration

`prefflow` accepts a configuration file in JSON. All the entries are optional, and file paths are
relative to the location of the configuration file.

```text
{
  "title": "Queensland Election Preference Flow Explorer",
  "electoratesFile": "electorates.json",
  "distributionFile": "distributions.csv",
  "firstPrefsFile": "first_prefs.csv",
  "finalTallyFile": "final_tally.csv",
  "excelWorksheetName": "Sheet1",
  "rules": {
    "sourceParty": "The Greens",
    "designatedParty": "ALP",
    "independentParty": "IND"
  }
}
```

Without a configuration file, `--data-dir` points to a directory with the default file names above.

 */
